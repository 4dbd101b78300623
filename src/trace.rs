use std::fs;
use std::io;
use std::path::Path;

use crate::commons::{Addr, Instr};
use crate::error::SimError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TraceEntry {
    Access { core: usize, instr: Instr },
    /// `v`: toggle line by line output
    Verbose,
    /// `h`: print the hit rate
    HitRate,
    /// `p`: print cache contents
    Print,
}

pub fn read_trace(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Parses a whole trace, one entry per non-blank line.
pub fn parse_str(text: &str) -> Result<Vec<TraceEntry>, SimError> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| parse_line(i + 1, l))
        .collect()
}

fn parse_line(line: usize, text: &str) -> Result<TraceEntry, SimError> {
    let err = |reason: String| SimError::Trace { line, reason };
    let words = text.split_whitespace().collect::<Vec<_>>();
    match words.as_slice() {
        ["v"] => Ok(TraceEntry::Verbose),
        ["h"] => Ok(TraceEntry::HitRate),
        ["p"] => Ok(TraceEntry::Print),
        [cpu, op, addr] => {
            let core = cpu
                .strip_prefix('P')
                .and_then(|id| id.parse::<usize>().ok())
                .ok_or_else(|| err(format!("invalid processor `{cpu}`")))?;
            let addr = addr
                .parse::<u32>()
                .map(Addr)
                .map_err(|_| err(format!("invalid address `{addr}`")))?;
            let instr = match *op {
                "R" => Instr::Read(addr),
                "W" => Instr::Write(addr),
                _ => return Err(err(format!("unknown operation `{op}`, expected R or W"))),
            };
            Ok(TraceEntry::Access { core, instr })
        }
        _ => Err(err(format!("unknown trace input `{}`, expected (p, v, h)", text.trim()))),
    }
}
