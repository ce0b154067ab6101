//! Request and render pipeline for Surfview
//!
//! This crate provides:
//! - The `ImageService` seam and its reqwest-backed HTTP implementation
//! - Artifact materialization with bounded retention
//! - The render controller state machine with stale-outcome filtering
//! - The request pipeline and the session that wires form, debouncer and view

pub mod artifact;
pub mod error;
pub mod render;
pub mod request;
pub mod service;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use artifact::ArtifactStore;
pub use error::PipelineError;
pub use render::{Delivery, RenderController, RenderState, RenderStats, RequestToken, StalePolicy};
pub use request::RequestPipeline;
pub use service::{HttpImageService, ImageService};
pub use session::Session;
