use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use super::cache::Cache;
use crate::commons::*;
use crate::error::SimError;
use crate::stats::Statistics;

struct Sharer {
    id: CacheId,
    cache: Rc<RefCell<Cache>>,
}

/// Full-map directory over a ring of caches.
///
/// No per-address sharer vector is kept. Whoever holds a block is found by
/// asking every registered cache, which is what a miss pays a directory
/// access for. The requesting cache is never borrowed through its `RefCell`
/// here, so it may call in while it is itself mutably borrowed.
pub struct Directory {
    specs: SystemSpec,
    sharers: Vec<Sharer>,
}

impl Directory {
    pub fn new(specs: SystemSpec) -> Self {
        Directory {
            specs,
            sharers: Vec::new(),
        }
    }

    /// Registers a cache. Ids must be unique and lie on the ring.
    pub fn append_sharer(&mut self, cache: Rc<RefCell<Cache>>) -> Result<(), SimError> {
        let id = cache.borrow().id;
        if id.0 >= self.specs.num_caches {
            return Err(SimError::UnknownCore { core: id.0, num_caches: self.specs.num_caches });
        }
        if self.sharers.iter().any(|s| s.id == id) {
            return Err(SimError::DuplicateCache { core: id.0 });
        }
        self.sharers.push(Sharer { id, cache });
        Ok(())
    }

    pub fn sharer(&self, id: CacheId) -> Option<Rc<RefCell<Cache>>> {
        self.sharers.iter().find(|s| s.id == id).map(|s| s.cache.clone())
    }

    pub fn num_sharers(&self) -> usize {
        self.sharers.len()
    }

    // ring network

    /// hops from `from` to `to` on the ring
    pub fn distance(&self, from: CacheId, to: CacheId) -> u64 {
        let n = self.specs.num_caches as i64;
        (from.0 as i64 - to.0 as i64).rem_euclid(n) as u64
    }

    /// the candidate fewest hops away from `requester`, earliest on ties
    pub fn closest(&self, candidates: &[CacheId], requester: CacheId) -> Option<CacheId> {
        candidates
            .iter()
            .copied()
            .min_by_key(|&c| self.distance(requester, c))
    }

    pub fn furthest_distance(&self, candidates: &[CacheId], requester: CacheId) -> u64 {
        candidates
            .iter()
            .map(|&c| self.distance(requester, c))
            .max()
            .unwrap_or(0)
    }

    // helper functions

    fn cache_of(&self, id: CacheId) -> Option<&Rc<RefCell<Cache>>> {
        self.sharers.iter().find(|s| s.id == id).map(|s| &s.cache)
    }

    /// caches other than `requester` holding `addr`, in registration order
    pub fn holders(&self, requester: CacheId, addr: Addr) -> Vec<CacheId> {
        self.sharers
            .iter()
            .filter(|s| s.id != requester)
            .filter(|s| s.cache.borrow().contains_address(addr))
            .map(|s| s.id)
            .collect()
    }

    fn get_sharers(&self, requester: CacheId, addr: Addr, stats: &mut Statistics) -> Vec<CacheId> {
        let holders = self.holders(requester, addr);
        stats.directory_access();
        debug!("sharers of {}: {:?}", addr, holders);
        holders
    }

    fn forward_line(&self, holders: &[CacheId], requester: &Cache, addr: Addr) {
        if let Some(cache) = self.closest(holders, requester.id).and_then(|id| self.cache_of(id)) {
            cache.borrow().send_line(requester, addr);
        }
    }

    // runs on every eviction of a usable line; the lookup itself is free
    fn optimize_check(&self, stored: Option<Addr>, requester: CacheId) {
        if !self.specs.protocol.allow_exclusive() {
            return;
        }
        let Some(stored) = stored else { return };
        debug!("cache {} evicted {}, looking for its last sharer", requester, stored);
        if let [last] = *self.holders(requester, stored).as_slice() {
            if let Some(cache) = self.cache_of(last) {
                info!("cache {} is the last sharer of {}", last, stored);
                cache.borrow_mut().alert_last_sharer(stored, requester);
            }
        }
    }

    // misses

    /// Serves a read miss and returns how many other caches held the block.
    pub fn read_miss(
        &self,
        requester: &Cache,
        addr: Addr,
        stored: Option<Addr>,
        stats: &mut Statistics,
    ) -> usize {
        debug!("directory read miss from cache {} for {}", requester.id, addr);
        self.optimize_check(stored, requester.id);

        let holders = self.get_sharers(requester.id, addr, stats);
        for &id in &holders {
            if let Some(cache) = self.cache_of(id) {
                cache.borrow_mut().remote_read_miss(addr, stats);
            }
        }

        if !holders.is_empty() {
            self.forward_line(&holders, requester, addr);
            stats.directory_request(); // ask the closest holder to send
            stats.cache_probe();
            stats.cache_access(); // holder reads out the block
            stats.processor_hop(self.furthest_distance(&holders, requester.id));
            stats.remote_access();
        } else {
            info!("no cache holds {}, fetching from memory", addr);
            stats.memory_access();
            stats.directory_request();
            stats.off_chip_access();
        }
        holders.len()
    }

    /// Serves a write miss and returns the number of invalidations sent.
    pub fn write_miss(
        &self,
        requester: &Cache,
        addr: Addr,
        need_data: bool,
        stored: Option<Addr>,
        stats: &mut Statistics,
    ) -> usize {
        debug!(
            "directory write miss from cache {} for {}, data needed: {}",
            requester.id, addr, need_data
        );
        if need_data {
            stats.write_miss_data_needed();
        }
        self.optimize_check(stored, requester.id);

        let holders = self.get_sharers(requester.id, addr, stats);
        if holders.is_empty() {
            if need_data {
                info!("no cache holds {}, fetching from memory", addr);
                stats.memory_access();
                stats.off_chip_access();
            } else {
                stats.write_miss_no_sharers();
                stats.remote_access();
            }
            stats.directory_request();
            return 0;
        }

        info!("invalidating {} in caches {:?}", addr, holders);
        stats.directory_request();
        for &id in &holders {
            if let Some(cache) = self.cache_of(id) {
                cache.borrow_mut().invalidate_line(addr, requester);
            }
        }
        if need_data {
            self.forward_line(&holders, requester, addr);
            // with several holders the transfer hides behind the invalidation acks
            if holders.len() == 1 {
                stats.cache_access();
            }
        }
        stats.cache_probe();
        stats.processor_hop(self.furthest_distance(&holders, requester.id));
        stats.invalidations_sent(holders.len() as u64);
        stats.remote_access();
        holders.len()
    }
}
