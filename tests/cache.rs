use std::cell::RefCell;
use std::rc::Rc;

use cachesim_dir::*;

const ADDRESS: Addr = Addr(12611);
const TAG: u32 = 6;
const INDEX: usize = 80;

fn setup(n: usize) -> (Directory, Vec<Rc<RefCell<Cache>>>, Statistics) {
    let specs = SystemSpec { num_caches: n, ..Default::default() };
    let mut directory = Directory::new(specs);
    let caches = (0..n)
        .map(|i| Rc::new(RefCell::new(Cache::new(CacheId(i), specs).unwrap())))
        .collect::<Vec<_>>();
    for c in &caches {
        directory.append_sharer(c.clone()).unwrap();
    }
    (directory, caches, Statistics::new())
}

fn set_line(cache: &Rc<RefCell<Cache>>, tag: u32, state: LineState) {
    let mut cache = cache.borrow_mut();
    let line = cache.line_mut(INDEX).unwrap();
    line.valid = true;
    line.tag = tag;
    line.state = state;
}

fn state(cache: &Rc<RefCell<Cache>>) -> LineState {
    cache.borrow().line(INDEX).unwrap().state
}

// writes

#[test]
fn test_write_hit() {
    let (dir, caches, mut stats) = setup(1);
    set_line(&caches[0], TAG, LineState::Modified);

    assert!(caches[0].borrow_mut().write(ADDRESS, &dir, &mut stats));
    assert_eq!(stats.directory_requests(), 0);
    assert_eq!(stats.directory_accesses(), 0);
    assert_eq!(stats.cache_probes(), 1);
    assert_eq!(stats.cache_accesses(), 1);
    assert_eq!(stats.private_accesses(), 1);
    assert_eq!(state(&caches[0]), LineState::Modified);
}

#[test]
fn test_write_miss_invalid_state() {
    let (dir, caches, mut stats) = setup(1);
    set_line(&caches[0], TAG, LineState::Invalid);

    assert!(!caches[0].borrow_mut().write(ADDRESS, &dir, &mut stats));
    assert_eq!(stats.coherence_misses(), 1);
    assert_eq!(stats.compulsory_misses(), 0);
    assert_eq!(stats.write_misses_needing_data(), 1);
    assert_eq!(stats.memory_accesses(), 1);
    assert_eq!(stats.off_chip_accesses(), 1);
    assert_eq!(state(&caches[0]), LineState::Modified);
}

#[test]
fn test_write_miss_shared_state() {
    let (dir, caches, mut stats) = setup(1);
    set_line(&caches[0], TAG, LineState::Shared);

    assert!(!caches[0].borrow_mut().write(ADDRESS, &dir, &mut stats));
    assert_eq!(stats.write_misses_needing_data(), 0);
    assert_eq!(stats.write_misses_without_sharers(), 1);
    assert_eq!(stats.remote_accesses(), 1);
    assert_eq!(stats.memory_accesses(), 0);
    assert_eq!(state(&caches[0]), LineState::Modified);
    assert!(caches[0].borrow().line(INDEX).unwrap().dirty);
}

#[test]
fn test_write_miss_bad_tag() {
    let (dir, caches, mut stats) = setup(1);
    set_line(&caches[0], 3567, LineState::Shared);

    assert!(!caches[0].borrow_mut().write(ADDRESS, &dir, &mut stats));
    assert_eq!(stats.compulsory_misses(), 0);
    assert_eq!(stats.replacement_writebacks(), 0);
    let cache = caches[0].borrow();
    assert_eq!(cache.line(INDEX).unwrap().tag, TAG);
    assert_eq!(cache.line(INDEX).unwrap().state, LineState::Modified);
}

#[test]
fn test_write_miss_cold_line_is_compulsory() {
    let (dir, caches, mut stats) = setup(1);

    assert!(!caches[0].borrow_mut().write(ADDRESS, &dir, &mut stats));
    assert_eq!(stats.compulsory_misses(), 1);
    assert_eq!(stats.directory_requests(), 2);
}

#[test]
fn test_write_miss_evicting_modified_writes_back() {
    let (dir, caches, mut stats) = setup(1);
    set_line(&caches[0], 3567, LineState::Modified);

    assert!(!caches[0].borrow_mut().write(ADDRESS, &dir, &mut stats));
    assert_eq!(stats.replacement_writebacks(), 1);
}

#[test]
fn test_write_miss_multi_sharers() {
    let (dir, caches, mut stats) = setup(4);
    for c in &caches {
        set_line(c, TAG, LineState::Shared);
    }

    assert!(!caches[2].borrow_mut().write(ADDRESS, &dir, &mut stats));
    for (i, c) in caches.iter().enumerate() {
        let expected = if i == 2 { LineState::Modified } else { LineState::Invalid };
        assert_eq!(state(c), expected, "cache {}", i);
    }
    assert_eq!(stats.invalidations(), 3);
    // furthest holder is cache 3, (2 - 3) mod 4 = 3 hops away
    assert_eq!(stats.processor_hops(), 3);
    assert_eq!(stats.remote_accesses(), 1);
    // data was present, nothing to fetch
    assert_eq!(stats.cache_accesses(), 1);
}

#[test]
fn test_write_miss_single_holder_forwards_data() {
    let (dir, caches, mut stats) = setup(4);
    set_line(&caches[1], TAG, LineState::Modified);

    assert!(!caches[0].borrow_mut().write(ADDRESS, &dir, &mut stats));
    assert_eq!(state(&caches[1]), LineState::Invalid);
    assert_eq!(stats.invalidations(), 1);
    // one access by the holder, one by the requester's own write
    assert_eq!(stats.cache_accesses(), 2);
    assert_eq!(stats.processor_hops(), 3);
}

// reads

#[test]
fn test_read_hit_modified() {
    let (dir, caches, mut stats) = setup(1);
    set_line(&caches[0], TAG, LineState::Modified);

    assert!(caches[0].borrow_mut().read(ADDRESS, &dir, &mut stats));
    assert_eq!(state(&caches[0]), LineState::Modified);
    assert_eq!(stats.private_accesses(), 1);
    assert_eq!(stats.directory_requests(), 0);
}

#[test]
fn test_read_hit_shared_state() {
    let (dir, caches, mut stats) = setup(1);
    set_line(&caches[0], TAG, LineState::Shared);

    assert!(caches[0].borrow_mut().read(ADDRESS, &dir, &mut stats));
    assert_eq!(state(&caches[0]), LineState::Shared);
}

#[test]
fn test_read_miss_invalid_state() {
    let (dir, caches, mut stats) = setup(1);
    set_line(&caches[0], TAG, LineState::Invalid);

    assert!(!caches[0].borrow_mut().read(ADDRESS, &dir, &mut stats));
    assert_eq!(stats.coherence_misses(), 1);
    assert_eq!(state(&caches[0]), LineState::Shared);
}

#[test]
fn test_read_miss_bad_tag() {
    let (dir, caches, mut stats) = setup(3);
    set_line(&caches[0], 3567, LineState::Shared);

    assert!(!caches[0].borrow_mut().read(ADDRESS, &dir, &mut stats));
    assert_eq!(stats.conflict_misses(), 1);
    assert_eq!(stats.compulsory_misses(), 0);
    assert_eq!(stats.replacement_writebacks(), 0);
    assert_eq!(caches[0].borrow().line(INDEX).unwrap().tag, TAG);
}

#[test]
fn test_read_miss_evicting_modified_writes_back() {
    let (dir, caches, mut stats) = setup(1);
    set_line(&caches[0], 3567, LineState::Modified);

    assert!(!caches[0].borrow_mut().read(ADDRESS, &dir, &mut stats));
    assert_eq!(stats.replacement_writebacks(), 1);
    assert_eq!(stats.conflict_misses(), 1);
    assert!(!caches[0].borrow().line(INDEX).unwrap().dirty);
}

#[test]
fn test_read_miss_multi_sharers() {
    let (dir, caches, mut stats) = setup(4);
    for c in &caches {
        set_line(c, TAG, LineState::Shared);
    }
    set_line(&caches[3], TAG, LineState::Invalid);

    assert!(!caches[3].borrow_mut().read(ADDRESS, &dir, &mut stats));
    for c in &caches {
        assert_eq!(state(c), LineState::Shared);
    }
    assert_eq!(stats.remote_accesses(), 1);
    assert_eq!(stats.processor_hops(), 3);
    assert_eq!(stats.coherence_writebacks(), 0);
}

#[test]
fn test_remote_miss() {
    let (dir, caches, mut stats) = setup(4);
    set_line(&caches[3], TAG, LineState::Modified);

    caches[0].borrow_mut().read(ADDRESS, &dir, &mut stats);
    assert_eq!(state(&caches[3]), LineState::Shared);
    assert_eq!(state(&caches[0]), LineState::Shared);
    assert_eq!(stats.coherence_writebacks(), 1);
    // (0 - 3) mod 4
    assert_eq!(stats.processor_hops(), 1);
}

// remote operations

#[test]
fn test_contains_address() {
    let (_, caches, _) = setup(1);
    assert!(!caches[0].borrow().contains_address(ADDRESS));

    set_line(&caches[0], TAG, LineState::Shared);
    assert!(caches[0].borrow().contains_address(ADDRESS));
    assert!(!caches[0].borrow().contains_address(Addr(ADDRESS.0 + 2048)));

    set_line(&caches[0], TAG, LineState::Invalid);
    assert!(!caches[0].borrow().contains_address(ADDRESS));
}

#[test]
fn test_invalidate_line_keeps_tag() {
    let (_, caches, _) = setup(2);
    set_line(&caches[1], TAG, LineState::Shared);

    let requester = caches[0].borrow();
    caches[1].borrow_mut().invalidate_line(ADDRESS, &requester);
    let cache = caches[1].borrow();
    let line = cache.line(INDEX).unwrap();
    assert_eq!(line.state, LineState::Invalid);
    assert!(line.valid);
    assert_eq!(line.tag, TAG);
}

#[test]
fn test_invalidate_line_ignores_other_tags() {
    let (_, caches, _) = setup(2);
    set_line(&caches[1], 3567, LineState::Shared);

    let requester = caches[0].borrow();
    caches[1].borrow_mut().invalidate_line(ADDRESS, &requester);
    assert_eq!(state(&caches[1]), LineState::Shared);
}

#[test]
fn test_display_lists_valid_lines() {
    let (_, caches, _) = setup(1);
    set_line(&caches[0], TAG, LineState::Modified);
    let out = caches[0].borrow().to_string();
    assert!(out.starts_with("cache 0:"));
    assert!(out.contains("80"));
    assert!(out.contains('M'));
    assert_eq!(out.lines().count(), 2);
}

#[test]
fn test_line_out_of_range() {
    let (_, caches, _) = setup(1);
    let mut cache = caches[0].borrow_mut();
    assert!(cache.line(INDEX).is_some());
    assert!(cache.line(512).is_none());
    assert!(cache.line_mut(512).is_none());
}
