//! A directory-based MSI/MESI cache coherence simulator.
//!
//! Every core owns a direct-mapped private cache. Misses go to a single
//! directory which finds the other holders of the block, invalidates or
//! downgrades them and charges the network hops of a ring interconnect.
//! The simulator tracks coherence state and cost only, no data.

pub mod commons;
pub mod error;
pub mod msi;
pub mod simulation;
pub mod stats;
pub mod trace;
pub mod verbosity;

pub use commons::*;
pub use error::SimError;
pub use msi::{Cache, Directory, Line, LineState};
pub use simulation::Simulation;
pub use stats::{AccessKind, Counters, Statistics};
pub use trace::TraceEntry;
pub use verbosity::Verbosity;
