//! Session wiring
//!
//! Connects a live form to the debouncer and the request pipeline:
//! input -> debounce -> snapshot -> request -> render.

use crate::render::RenderController;
use crate::request::RequestPipeline;
use crate::service::ImageService;
use anyhow::{Context, Result};
use scheduler::{DebounceStats, DebouncedTask};
use std::sync::Arc;
use std::time::Duration;
use sv_core::{FormSource, ViewPort};
use tokio::runtime::Handle;
use tracing::info;

/// One form, one debouncer, one pipeline
pub struct Session<F, S, V>
where
    F: FormSource + 'static,
    S: ImageService,
    V: ViewPort + 'static,
{
    form: Arc<F>,
    pipeline: Arc<RequestPipeline<S, V>>,
    debouncer: DebouncedTask,
}

impl<F, S, V> Session<F, S, V>
where
    F: FormSource + 'static,
    S: ImageService,
    V: ViewPort + 'static,
{
    /// Create a session on the current tokio runtime
    ///
    /// Nothing is requested until [`Session::start`].
    pub fn new(
        form: Arc<F>,
        pipeline: Arc<RequestPipeline<S, V>>,
        delay: Duration,
    ) -> Result<Self> {
        let runtime =
            Handle::try_current().context("Session must be created inside a tokio runtime")?;

        let trigger = {
            let form = Arc::clone(&form);
            let pipeline = Arc::clone(&pipeline);
            let runtime = runtime.clone();
            move || {
                // Snapshot at trigger time, not when the response arrives
                let snapshot = form.capture_snapshot();
                drop(pipeline.dispatch(snapshot, &runtime));
            }
        };

        Ok(Self {
            form,
            pipeline,
            debouncer: DebouncedTask::with_handle(delay, runtime, trigger),
        })
    }

    /// Initial load: request once with the current form, no delay
    pub fn start(&self) {
        info!("Initial load");
        self.debouncer.fire_now();
    }

    /// Record an input event
    pub fn notify_change(&self) {
        self.debouncer.notify_change();
    }

    /// Fire a pending trigger immediately, returning whether one was pending
    pub fn flush(&self) -> bool {
        self.debouncer.flush()
    }

    /// Flush pending input, then wait for every in-flight request to render
    pub async fn settle(&self) {
        self.flush();
        self.controller().wait_idle().await;
    }

    pub fn form(&self) -> &Arc<F> {
        &self.form
    }

    pub fn controller(&self) -> &Arc<RenderController<V>> {
        self.pipeline.controller()
    }

    pub fn debounce_stats(&self) -> DebounceStats {
        self.debouncer.stats()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}
