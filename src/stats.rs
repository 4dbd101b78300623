//! Event counters and per-instruction latency accounting.
//!
//! Every cache and directory operation reports what it did (a probe, a
//! directory request, a memory access, ...) to a [`Statistics`] value owned
//! by the simulation. At the end of each instruction the counters that
//! moved since the previous instruction are priced with the
//! [`latency`](crate::commons::latency) table and the result is filed under
//! the kind of access the instruction turned out to be.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::commons::latency;
use crate::error::SimError;

/// Counters that contribute to instruction latency or classification.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Counters {
    pub cache_probes: u64,
    pub cache_accesses: u64,
    pub sram_accesses: u64,
    pub directory_accesses: u64,
    pub processor_hops: u64,
    pub directory_hops: u64,
    pub memory_accesses: u64,

    pub private_accesses: u64,
    pub remote_accesses: u64,
    pub off_chip_accesses: u64,
}

impl Counters {
    /// cycles spent between `prev` and `self`
    pub fn latency_since(&self, prev: &Counters) -> u64 {
        (self.cache_probes - prev.cache_probes) * latency::CACHE_PROBE
            + (self.cache_accesses - prev.cache_accesses) * latency::CACHE_ACCESS
            + (self.sram_accesses - prev.sram_accesses) * latency::SRAM_ACCESS
            + (self.directory_accesses - prev.directory_accesses) * latency::DIRECTORY_ACCESS
            + (self.processor_hops - prev.processor_hops) * latency::PROCESSOR_HOP
            + (self.directory_hops - prev.directory_hops) * latency::DIRECTORY_HOP
            + (self.memory_accesses - prev.memory_accesses) * latency::MEMORY_ACCESS
    }

    pub fn total_accesses(&self) -> u64 {
        self.private_accesses + self.remote_accesses + self.off_chip_accesses
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AccessKind {
    Private,
    Remote,
    OffChip,
}

#[derive(Clone, Debug, Default)]
pub struct Statistics {
    instructions: u64,

    current: Counters,
    previous: Counters,

    // miss breakdown
    compulsory_misses: u64,
    conflict_misses: u64,
    capacity_misses: u64,
    coherence_misses: u64,

    // line was Shared and the directory found nobody to invalidate
    write_miss_no_sharers: u64,
    // line was missing or Invalid, so the write had to fetch the block
    write_miss_data_needed: u64,

    hop_histogram: BTreeMap<u64, u64>,

    replacement_writebacks: u64,
    coherence_writebacks: u64,
    invalidations_sent: u64,

    private_latencies: Vec<u64>,
    remote_latencies: Vec<u64>,
    off_chip_latencies: Vec<u64>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // instruction bracketing

    pub fn add_instruction(&mut self) {
        self.instructions += 1;
    }

    /// Prices the instruction that just ran and starts a new one.
    ///
    /// Fails without touching the baseline if the instruction recorded no
    /// private, remote or off-chip access.
    pub fn end_instruction(&mut self) -> Result<(u64, AccessKind), SimError> {
        let cycles = self.current_latency();
        let (cur, prev) = (&self.current, &self.previous);
        let kind = if cur.private_accesses != prev.private_accesses {
            AccessKind::Private
        } else if cur.remote_accesses != prev.remote_accesses {
            AccessKind::Remote
        } else if cur.off_chip_accesses != prev.off_chip_accesses {
            AccessKind::OffChip
        } else {
            return Err(SimError::UnclassifiedInstruction {
                instruction: self.instructions,
            });
        };
        match kind {
            AccessKind::Private => self.private_latencies.push(cycles),
            AccessKind::Remote => self.remote_latencies.push(cycles),
            AccessKind::OffChip => self.off_chip_latencies.push(cycles),
        }
        debug!("instruction {} took {} cycles ({:?})", self.instructions, cycles, kind);
        self.previous = self.current;
        Ok((cycles, kind))
    }

    /// latency accumulated by the instruction in flight
    pub fn current_latency(&self) -> u64 {
        self.current.latency_since(&self.previous)
    }

    // misses

    pub fn compulsory_miss(&mut self) {
        trace!("compulsory miss");
        self.compulsory_misses += 1;
    }
    pub fn conflict_miss(&mut self) {
        trace!("conflict miss");
        self.conflict_misses += 1;
    }
    pub fn capacity_miss(&mut self) {
        trace!("capacity miss");
        self.capacity_misses += 1;
    }
    pub fn coherence_miss(&mut self) {
        trace!("coherence miss");
        self.coherence_misses += 1;
    }
    pub fn write_miss_no_sharers(&mut self) {
        trace!("write miss without sharers, no data needed");
        self.write_miss_no_sharers += 1;
    }
    pub fn write_miss_data_needed(&mut self) {
        trace!("write miss, data needed");
        self.write_miss_data_needed += 1;
    }

    // latency events

    pub fn cache_probe(&mut self) {
        trace!("cache probe");
        self.current.cache_probes += 1;
    }
    pub fn cache_access(&mut self) {
        trace!("cache access");
        self.current.cache_accesses += 1;
    }
    pub fn sram_access(&mut self) {
        trace!("sram access");
        self.current.sram_accesses += 1;
    }
    pub fn directory_access(&mut self) {
        trace!("directory access");
        self.current.directory_accesses += 1;
    }
    pub fn processor_hop(&mut self, hops: u64) {
        trace!("{} processor hops", hops);
        self.current.processor_hops += hops;
        *self.hop_histogram.entry(hops).or_insert(0) += 1;
    }
    pub fn directory_request(&mut self) {
        trace!("directory request");
        self.current.directory_hops += 1;
    }
    pub fn memory_access(&mut self) {
        trace!("memory access");
        self.current.memory_accesses += 1;
    }

    // access classification and traffic

    pub fn private_access(&mut self) {
        trace!("private access");
        self.current.private_accesses += 1;
    }
    pub fn remote_access(&mut self) {
        trace!("remote access");
        self.current.remote_accesses += 1;
    }
    pub fn off_chip_access(&mut self) {
        trace!("off-chip access");
        self.current.off_chip_accesses += 1;
    }
    pub fn replacement_writeback(&mut self) {
        trace!("replacement writeback");
        self.replacement_writebacks += 1;
    }
    pub fn coherence_writeback(&mut self) {
        trace!("coherence writeback");
        self.coherence_writebacks += 1;
    }
    pub fn invalidations_sent(&mut self, n: u64) {
        trace!("{} invalidations sent", n);
        self.invalidations_sent += n;
    }

    // accessors

    pub fn instructions(&self) -> u64 { self.instructions }
    pub fn counters(&self) -> &Counters { &self.current }
    pub fn cache_probes(&self) -> u64 { self.current.cache_probes }
    pub fn cache_accesses(&self) -> u64 { self.current.cache_accesses }
    pub fn sram_accesses(&self) -> u64 { self.current.sram_accesses }
    pub fn directory_accesses(&self) -> u64 { self.current.directory_accesses }
    pub fn processor_hops(&self) -> u64 { self.current.processor_hops }
    pub fn directory_requests(&self) -> u64 { self.current.directory_hops }
    pub fn memory_accesses(&self) -> u64 { self.current.memory_accesses }
    pub fn private_accesses(&self) -> u64 { self.current.private_accesses }
    pub fn remote_accesses(&self) -> u64 { self.current.remote_accesses }
    pub fn off_chip_accesses(&self) -> u64 { self.current.off_chip_accesses }
    pub fn total_accesses(&self) -> u64 { self.current.total_accesses() }
    pub fn compulsory_misses(&self) -> u64 { self.compulsory_misses }
    pub fn conflict_misses(&self) -> u64 { self.conflict_misses }
    pub fn capacity_misses(&self) -> u64 { self.capacity_misses }
    pub fn coherence_misses(&self) -> u64 { self.coherence_misses }
    pub fn write_misses_without_sharers(&self) -> u64 { self.write_miss_no_sharers }
    pub fn write_misses_needing_data(&self) -> u64 { self.write_miss_data_needed }
    pub fn replacement_writebacks(&self) -> u64 { self.replacement_writebacks }
    pub fn coherence_writebacks(&self) -> u64 { self.coherence_writebacks }
    pub fn invalidations(&self) -> u64 { self.invalidations_sent }
    pub fn hop_histogram(&self) -> &BTreeMap<u64, u64> { &self.hop_histogram }
    pub fn private_latencies(&self) -> &[u64] { &self.private_latencies }
    pub fn remote_latencies(&self) -> &[u64] { &self.remote_latencies }
    pub fn off_chip_latencies(&self) -> &[u64] { &self.off_chip_latencies }

    // derived statistics

    pub fn hit_rate(&self) -> f64 {
        if self.instructions == 0 {
            return 0.0;
        }
        self.current.private_accesses as f64 / self.instructions as f64
    }

    pub fn total_latency(&self) -> u64 {
        self.private_latencies.iter().sum::<u64>()
            + self.remote_latencies.iter().sum::<u64>()
            + self.off_chip_latencies.iter().sum::<u64>()
    }

    pub fn average_latency(&self) -> f64 {
        if self.instructions == 0 {
            return 0.0;
        }
        self.total_latency() as f64 / self.instructions as f64
    }

    pub fn private_average_latency(&self) -> f64 {
        mean(&self.private_latencies)
    }
    pub fn remote_average_latency(&self) -> f64 {
        mean(&self.remote_latencies)
    }
    pub fn off_chip_average_latency(&self) -> f64 {
        mean(&self.off_chip_latencies)
    }

    // reports

    /// The statistics written to the output file.
    pub fn key_report(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "Private-accesses: {}", self.private_accesses());
        let _ = writeln!(s, "Remote-accesses: {}", self.remote_accesses());
        let _ = writeln!(s, "Off-chip-accesses: {}", self.off_chip_accesses());
        let _ = writeln!(s, "Total-accesses: {}", self.total_accesses());
        let _ = writeln!(s, "Replacement-writebacks: {}", self.replacement_writebacks);
        let _ = writeln!(s, "Coherence-writebacks: {}", self.coherence_writebacks);
        let _ = writeln!(s, "Invalidations-sent: {}", self.invalidations_sent);
        let _ = writeln!(s, "Average-latency: {}", self.average_latency());
        let _ = writeln!(s, "Priv-average-latency: {}", self.private_average_latency());
        let _ = writeln!(s, "Rem-average-latency: {}", self.remote_average_latency());
        let _ = writeln!(s, "Off-chip-average-latency: {}", self.off_chip_average_latency());
        let _ = write!(s, "Total-latency: {}", self.total_latency());
        s
    }

    /// Absolute counters next to what the instruction in flight added.
    pub fn debug_report(&self) -> String {
        let (cur, prev) = (&self.current, &self.previous);
        let rows = [
            ("cache accesses", cur.cache_accesses, prev.cache_accesses),
            ("cache probes", cur.cache_probes, prev.cache_probes),
            ("sram accesses", cur.sram_accesses, prev.sram_accesses),
            ("processor hops", cur.processor_hops, prev.processor_hops),
            ("directory accesses", cur.directory_accesses, prev.directory_accesses),
            ("directory requests", cur.directory_hops, prev.directory_hops),
            ("memory accesses", cur.memory_accesses, prev.memory_accesses),
        ];
        let mut s = String::new();
        let _ = writeln!(s, "instruction: {}", self.instructions);
        for (name, total, before) in rows {
            let _ = writeln!(s, "{name}: {total} (+{})", total - before);
        }
        let _ = writeln!(s, "instruction latency: {}", self.current_latency());
        let _ = writeln!(s, "compulsory misses: {}", self.compulsory_misses);
        let _ = writeln!(s, "conflict misses: {}", self.conflict_misses);
        let _ = writeln!(s, "capacity misses: {}", self.capacity_misses);
        let _ = writeln!(s, "coherence misses: {}", self.coherence_misses);
        let _ = writeln!(s, "write misses without sharers: {}", self.write_miss_no_sharers);
        let _ = writeln!(s, "write misses needing data: {}", self.write_miss_data_needed);
        for (hops, count) in &self.hop_histogram {
            let _ = writeln!(s, "{hops} hop broadcasts: {count}");
        }
        s
    }

    /// Writes the key report to `out_<name>` next to `trace_path`.
    pub fn save(&self, trace_path: &Path) -> io::Result<PathBuf> {
        let name = trace_path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "trace path has no file name"))?;
        let mut out_name = std::ffi::OsString::from("out_");
        out_name.push(name);
        let out = trace_path.with_file_name(out_name);
        fs::write(&out, self.key_report())?;
        Ok(out)
    }
}

fn mean(latencies: &[u64]) -> f64 {
    if latencies.is_empty() {
        return 0.0;
    }
    latencies.iter().sum::<u64>() as f64 / latencies.len() as f64
}
