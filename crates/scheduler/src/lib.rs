//! Input coalescing for Surfview
//!
//! This crate provides the debounce scheduler that turns a burst of raw
//! change notifications into a single delayed trigger:
//! - Generation counter owned per instance (no shared global)
//! - Configurable fixed delay (1000ms by default)
//! - Explicit runtime and timer handles
//! - Immediate, flush and cancel paths for startup and shutdown

pub mod debounce;

pub use debounce::{DebounceStats, DebouncedTask, DEFAULT_DELAY, NEUTRAL_GENERATION};
