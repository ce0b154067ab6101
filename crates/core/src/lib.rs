//! Surfview Core - shared data model for the render client
//!
//! This crate provides:
//! - Immutable form snapshots and the live form they are captured from
//! - Request outcomes and image payloads
//! - The `ViewPort` rendering seam and derived visual state
//! - Hex color parsing

pub mod color;
pub mod form;
pub mod outcome;
pub mod snapshot;
pub mod view;

// Re-export main types for convenience
pub use color::{parse_hex, ColorError, Rgb};
pub use form::{FormSource, LiveForm};
pub use outcome::{Payload, RequestOutcome};
pub use snapshot::FormSnapshot;
pub use view::{Artifact, ArtifactStyle, HintOpacity, ViewPort, VisualState};
