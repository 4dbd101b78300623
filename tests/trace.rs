use cachesim_dir::trace::parse_str;
use cachesim_dir::{Addr, Instr, SimError, TraceEntry};

fn access(core: usize, instr: Instr) -> TraceEntry {
    TraceEntry::Access { core, instr }
}

#[test]
fn test_modify_lines_command() {
    let entries = parse_str("P0 W 1299\nP4 R 0\n").unwrap();
    assert_eq!(
        entries,
        vec![access(0, Instr::Write(Addr(1299))), access(4, Instr::Read(Addr(0)))]
    );
}

#[test]
fn test_modify_lines_no_command() {
    let entries = parse_str("P0 W 1299\nP4 R 0\nv\nh\nP2 W 1290\np").unwrap();
    assert_eq!(
        entries,
        vec![
            access(0, Instr::Write(Addr(1299))),
            access(4, Instr::Read(Addr(0))),
            TraceEntry::Verbose,
            TraceEntry::HitRate,
            access(2, Instr::Write(Addr(1290))),
            TraceEntry::Print,
        ]
    );
}

#[test]
fn test_blank_lines_and_padding() {
    let entries = parse_str("\n  P12 R 7  \r\n\n").unwrap();
    assert_eq!(entries, vec![access(12, Instr::Read(Addr(7)))]);
}

#[test]
fn test_errors_name_the_line() {
    let line_of = |text: &str| match parse_str(text) {
        Err(SimError::Trace { line, .. }) => line,
        other => panic!("expected trace error, got {:?}", other),
    };
    assert_eq!(line_of("x"), 1);
    assert_eq!(line_of("P0 R 1\n\nP0 X 12"), 3);
    assert_eq!(line_of("Q1 R 3"), 1);
    assert_eq!(line_of("P0 R abc"), 1);
    assert_eq!(line_of("P0 R -4"), 1);
    assert_eq!(line_of("P0 R"), 1);
}
