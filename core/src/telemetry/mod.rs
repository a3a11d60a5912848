//! telemetry/mod.rs
//! Counters, stage timers and the immutable per-call snapshot.
//!
//! Counters are plain fields owned by one ingest call; no atomics or locks.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
