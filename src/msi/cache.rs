use std::fmt;

use log::{debug, info};

use super::directory::Directory;
use super::line::{Line, LineState};
use crate::commons::*;
use crate::error::SimError;
use crate::stats::Statistics;

// data cache, direct mapped

pub struct Cache {
    pub id: CacheId,
    specs: SystemSpec,
    layout: AddressLayout,
    lines: Vec<Line>,
}

impl Cache {
    pub fn new(id: CacheId, specs: SystemSpec) -> Result<Self, SimError> {
        let layout = specs.validate()?;
        Ok(Self {
            id,
            specs,
            layout,
            lines: vec![Line::new(); layout.num_lines()],
        })
    }

    pub fn layout(&self) -> &AddressLayout {
        &self.layout
    }
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }
    pub fn line_mut(&mut self, index: usize) -> Option<&mut Line> {
        self.lines.get_mut(index)
    }
    /// state of the line `addr` maps to, if that line currently holds `addr`
    pub fn state_of(&self, addr: Addr) -> LineState {
        let (tag, index, _) = self.layout.decode(addr);
        let line = &self.lines[index];
        if line.holds(tag) { line.state } else { LineState::Invalid }
    }

    // helper functions

    // address of the block a line is about to give up, if it holds one
    fn evicted_address(&self, index: usize) -> Option<Addr> {
        let line = &self.lines[index];
        if line.valid && line.state != LineState::Invalid {
            Some(self.layout.stored_address(line.tag, index))
        } else {
            None
        }
    }

    // processor requests

    /// Returns whether the write hit.
    pub fn write(&mut self, addr: Addr, directory: &Directory, stats: &mut Statistics) -> bool {
        info!("cache {} writing to address {}", self.id, addr);
        let (tag, index, _) = self.layout.decode(addr);
        let line = self.lines[index];

        stats.cache_probe(); // tag and state check
        if line.valid && line.tag == tag {
            match line.state {
                LineState::Shared => {
                    // data is present, only ownership is missing
                    self.write_miss(index, tag, addr, false, None, directory, stats);
                    false
                }
                LineState::Invalid => {
                    stats.coherence_miss();
                    self.write_miss(index, tag, addr, true, None, directory, stats);
                    false
                }
                LineState::Modified | LineState::Exclusive => {
                    debug!("write hit in state {}", line.state);
                    self.lines[index].write(tag, stats);
                    stats.private_access();
                    true
                }
            }
        } else {
            if !line.valid {
                stats.compulsory_miss();
            }
            if line.state == LineState::Modified {
                debug!("evicting modified line with tag {}", line.tag);
                stats.replacement_writeback();
            }
            let stored = self.evicted_address(index);
            self.write_miss(index, tag, addr, true, stored, directory, stats);
            false
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn write_miss(
        &mut self,
        index: usize,
        tag: u32,
        addr: Addr,
        need_data: bool,
        stored: Option<Addr>,
        directory: &Directory,
        stats: &mut Statistics,
    ) {
        debug!("write miss in cache {}, data needed: {}", self.id, need_data);
        stats.directory_request();
        let invalidations = directory.write_miss(self, addr, need_data, stored, stats);
        debug!("cache {} expecting {} invalidation acks", self.id, invalidations);
        stats.cache_probe();
        self.lines[index].write(tag, stats);
    }

    /// Returns whether the read hit.
    pub fn read(&mut self, addr: Addr, directory: &Directory, stats: &mut Statistics) -> bool {
        info!("cache {} reading address {}", self.id, addr);
        let (tag, index, _) = self.layout.decode(addr);
        let line = self.lines[index];

        stats.cache_probe();
        if line.valid && line.tag == tag {
            match line.state {
                LineState::Invalid => {
                    stats.coherence_miss();
                    self.read_miss(index, tag, addr, None, directory, stats);
                    false
                }
                LineState::Shared | LineState::Modified | LineState::Exclusive => {
                    debug!("read hit in state {}", line.state);
                    stats.cache_access();
                    stats.private_access();
                    true
                }
            }
        } else {
            if !line.valid {
                stats.compulsory_miss();
            } else {
                stats.conflict_miss();
            }
            if line.state == LineState::Modified {
                debug!("evicting modified line with tag {}", line.tag);
                stats.replacement_writeback();
            }
            let stored = self.evicted_address(index);
            self.read_miss(index, tag, addr, stored, directory, stats);
            false
        }
    }

    fn read_miss(
        &mut self,
        index: usize,
        tag: u32,
        addr: Addr,
        stored: Option<Addr>,
        directory: &Directory,
        stats: &mut Statistics,
    ) {
        debug!("read miss in cache {}", self.id);
        stats.directory_request();
        let sharers = directory.read_miss(self, addr, stored, stats);
        let state = if self.specs.protocol.allow_exclusive() && sharers == 0 {
            LineState::Exclusive
        } else {
            LineState::Shared
        };
        let line = &mut self.lines[index];
        line.read(tag, stats);
        line.set_state(state, stats);
    }

    // requests from the directory and other caches

    pub fn remote_read_miss(&mut self, addr: Addr, stats: &mut Statistics) {
        let (tag, index, _) = self.layout.decode(addr);
        let allow_exclusive = self.specs.protocol.allow_exclusive();
        let line = &mut self.lines[index];
        if !(line.valid && line.tag == tag) {
            return;
        }
        match line.state {
            LineState::Modified => {
                debug!("cache {} downgrading {} from M to S", self.id, addr);
                line.state = LineState::Shared;
                line.dirty = false;
                stats.coherence_writeback();
            }
            LineState::Exclusive if allow_exclusive => {
                debug!("cache {} downgrading {} from E to S", self.id, addr);
                line.state = LineState::Shared;
            }
            _ => (),
        }
    }

    /// Hands the block over to `target`. No data is simulated, only the call.
    pub fn send_line(&self, target: &Cache, addr: Addr) {
        debug!("cache {} sending line {} to cache {}", self.id, addr, target.id);
    }

    /// Called when `evicting` dropped `addr` and this cache is the only one left holding it.
    pub fn alert_last_sharer(&mut self, addr: Addr, evicting: CacheId) {
        if !self.specs.protocol.allow_exclusive() {
            return;
        }
        let (tag, index, _) = self.layout.decode(addr);
        let line = &mut self.lines[index];
        if line.holds(tag) && line.state == LineState::Shared {
            debug!(
                "cache {} is last sharer of {} after eviction by cache {}, promoting to E",
                self.id, addr, evicting
            );
            line.state = LineState::Exclusive;
        }
    }

    pub fn invalidate_line(&mut self, addr: Addr, requester: &Cache) {
        let (tag, index, _) = self.layout.decode(addr);
        let line = &mut self.lines[index];
        if line.valid && line.tag == tag {
            debug!("cache {} invalidating {} for cache {}", self.id, addr, requester.id);
            line.invalidate();
            requester.confirm_invalidation(addr, self.id);
        }
    }

    pub fn confirm_invalidation(&self, addr: Addr, from: CacheId) {
        debug!("cache {} got invalidation ack for {} from cache {}", self.id, addr, from);
    }

    pub fn contains_address(&self, addr: Addr) -> bool {
        let (tag, index, _) = self.layout.decode(addr);
        self.lines[index].holds(tag)
    }
}

impl fmt::Display for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cache {}:", self.id)?;
        for (index, line) in self.lines.iter().enumerate().filter(|(_, l)| l.valid) {
            writeln!(f, "  {:>5}  tag {:<8} {}", index, line.tag, line.state)?;
        }
        Ok(())
    }
}
