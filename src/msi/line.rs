use std::fmt;

use crate::stats::Statistics;

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineState {
    #[default]
    Invalid,
    Shared,
    Modified,
    Exclusive,
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LineState::Invalid => "I",
            LineState::Shared => "S",
            LineState::Modified => "M",
            LineState::Exclusive => "E",
        };
        f.write_str(s)
    }
}

/// One slot of a direct-mapped cache.
///
/// `valid` is false only until the slot is first filled; afterwards an
/// invalidated line keeps its tag and `valid` flag and only its state
/// drops to `Invalid`.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Line {
    pub state: LineState,
    pub tag: u32,
    pub valid: bool,
    pub dirty: bool,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&mut self, tag: u32, stats: &mut Statistics) {
        self.tag = tag;
        self.state = LineState::Shared;
        self.valid = true;
        self.dirty = false;
        stats.cache_access();
    }

    pub fn write(&mut self, tag: u32, stats: &mut Statistics) {
        self.tag = tag;
        self.dirty = true;
        self.valid = true;
        self.state = LineState::Modified;
        stats.cache_access();
    }

    pub fn invalidate(&mut self) {
        self.state = LineState::Invalid;
    }

    pub fn set_state(&mut self, state: LineState, stats: &mut Statistics) {
        self.state = state;
        stats.cache_probe();
    }

    /// valid, tag-matching and not invalidated
    pub fn holds(&self, tag: u32) -> bool {
        self.valid && self.tag == tag && self.state != LineState::Invalid
    }
}
