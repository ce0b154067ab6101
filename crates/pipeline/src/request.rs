//! Request pipeline: one request per trigger, outcome handed to the controller

use crate::render::{Delivery, RenderController, RequestToken};
use crate::service::ImageService;
use std::sync::Arc;
use sv_core::{FormSnapshot, RequestOutcome, ViewPort};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Issues requests for snapshots and delivers their outcomes
pub struct RequestPipeline<S, V>
where
    S: ImageService,
    V: ViewPort + 'static,
{
    service: Arc<S>,
    controller: Arc<RenderController<V>>,
}

impl<S, V> RequestPipeline<S, V>
where
    S: ImageService,
    V: ViewPort + 'static,
{
    pub fn new(service: Arc<S>, controller: Arc<RenderController<V>>) -> Self {
        Self {
            service,
            controller,
        }
    }

    /// Request an image for `snapshot` without touching the view
    ///
    /// Transport and service failures both become `Failure(message)`.
    pub async fn fetch(&self, snapshot: FormSnapshot) -> RequestOutcome {
        info!("Requesting image ({} fields)", snapshot.len());

        match self.service.draw(&snapshot).await {
            Ok(payload) => RequestOutcome::Success { payload, snapshot },
            Err(e) => {
                let message = e.message();
                if e.is_transport() {
                    warn!("Image request could not reach the service: {}", message);
                }
                RequestOutcome::Failure { message }
            }
        }
    }

    /// Clear the error, request an image and render the outcome
    pub async fn submit(&self, snapshot: FormSnapshot) -> Delivery {
        let token = self.controller.begin();
        self.deliver(token, snapshot).await
    }

    /// Like `submit`, but returns as soon as the request is dispatched
    ///
    /// The controller enters `AwaitingResult` before this returns, so a
    /// following `wait_idle` cannot miss the request.
    pub fn dispatch(
        self: &Arc<Self>,
        snapshot: FormSnapshot,
        runtime: &Handle,
    ) -> JoinHandle<Delivery> {
        let token = self.controller.begin();
        let pipeline = Arc::clone(self);
        runtime.spawn(async move { pipeline.deliver(token, snapshot).await })
    }

    pub fn controller(&self) -> &Arc<RenderController<V>> {
        &self.controller
    }

    async fn deliver(&self, token: RequestToken, snapshot: FormSnapshot) -> Delivery {
        let outcome = self.fetch(snapshot).await;
        self.controller.on_outcome(token, outcome).await
    }
}
