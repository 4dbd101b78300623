use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use crate::commons::*;
use crate::error::SimError;
use crate::msi::{Cache, Directory};
use crate::stats::Statistics;
use crate::trace::TraceEntry;

/// One simulation run: a directory, its ring of caches and the statistics
/// they report to.
pub struct Simulation {
    specs: SystemSpec,
    directory: Directory,
    stats: Statistics,
}

impl Simulation {
    pub fn new(specs: SystemSpec) -> Result<Self, SimError> {
        specs.validate()?;
        let mut directory = Directory::new(specs);
        for i in 0..specs.num_caches {
            let cache = Cache::new(CacheId(i), specs)?;
            directory.append_sharer(Rc::new(RefCell::new(cache)))?;
        }
        Ok(Simulation {
            specs,
            directory,
            stats: Statistics::new(),
        })
    }

    pub fn specs(&self) -> &SystemSpec {
        &self.specs
    }
    pub fn directory(&self) -> &Directory {
        &self.directory
    }
    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn cache(&self, core: usize) -> Result<Rc<RefCell<Cache>>, SimError> {
        self.directory
            .sharer(CacheId(core))
            .ok_or(SimError::UnknownCore { core, num_caches: self.specs.num_caches })
    }

    /// Runs a single instruction on `core` and returns whether it hit.
    pub fn execute(&mut self, core: usize, instr: Instr) -> Result<bool, SimError> {
        let cache = self.cache(core)?;
        self.stats.add_instruction();
        let hit = {
            let mut cache = cache.borrow_mut();
            match instr {
                Instr::Read(addr) => cache.read(addr, &self.directory, &mut self.stats),
                Instr::Write(addr) => cache.write(addr, &self.directory, &mut self.stats),
            }
        };
        debug!("{}", self.stats.debug_report());
        self.stats.end_instruction()?;
        info!("{:?} on core {}: {}", instr, core, if hit { "hit" } else { "miss" });
        Ok(hit)
    }

    /// Executes every access in `entries`; control commands are skipped.
    pub fn run<I>(&mut self, entries: I) -> Result<(), SimError>
    where
        I: IntoIterator<Item = TraceEntry>,
    {
        for entry in entries {
            if let TraceEntry::Access { core, instr } = entry {
                self.execute(core, instr)?;
            }
        }
        Ok(())
    }

    /// Listing of every valid line in every cache.
    pub fn dump(&self) -> String {
        (0..self.specs.num_caches)
            .filter_map(|i| self.directory.sharer(CacheId(i)))
            .map(|c| c.borrow().to_string())
            .collect()
    }
}
