//! Render controller
//!
//! Applies request outcomes to a [`ViewPort`] and tracks whether any request
//! is still awaiting its result.

use crate::artifact::ArtifactStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use sv_core::{Artifact, RequestOutcome, ViewPort, VisualState};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How outcomes of overlapping requests are reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Render only the outcome of the most recently dispatched request
    #[default]
    LastTriggered,
    /// Render every outcome; whichever arrives last wins
    LastArrived,
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// No request is outstanding
    Idle,
    /// At least one dispatched request has not delivered its outcome
    AwaitingResult,
}

/// Monotonic identifier handed out when a request is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What happened to a delivered outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// An image was shown
    Shown,
    /// An error was shown
    Failed,
    /// A newer request was dispatched; the outcome was dropped
    Discarded,
}

/// Counters describing delivered outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub shown: u64,
    pub failed: u64,
    pub discarded: u64,
}

/// View plus the bookkeeping that must change together with it
struct Surface<V> {
    view: V,
    /// Requests dispatched but not yet delivered
    in_flight: usize,
    /// Token of the most recently dispatched request
    latest: u64,
}

enum Prepared {
    Image(Artifact, VisualState),
    Error(String),
    Stale,
}

/// Owns the view and is the only thing that mutates it
pub struct RenderController<V: ViewPort> {
    surface: Mutex<Surface<V>>,
    artifacts: ArtifactStore,
    policy: StalePolicy,
    state: watch::Sender<RenderState>,
    shown: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
}

impl<V: ViewPort> RenderController<V> {
    pub fn new(view: V, artifacts: ArtifactStore, policy: StalePolicy) -> Self {
        let (state, _) = watch::channel(RenderState::Idle);
        Self {
            surface: Mutex::new(Surface {
                view,
                in_flight: 0,
                latest: 0,
            }),
            artifacts,
            policy,
            state,
            shown: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Enter `AwaitingResult` for a new request
    ///
    /// Clears any displayed error and returns the request's token.
    pub fn begin(&self) -> RequestToken {
        let mut surface = self.surface.lock();

        surface.latest += 1;
        let token = RequestToken(surface.latest);

        surface.view.clear_error();
        surface.in_flight += 1;
        if surface.in_flight == 1 {
            surface.view.set_busy(true);
            self.state.send_replace(RenderState::AwaitingResult);
        }

        debug!("Dispatched request {} ({} in flight)", token.0, surface.in_flight);
        token
    }

    /// Apply the outcome of the request identified by `token`
    ///
    /// The image is written before the surface is locked, but it joins the
    /// artifact retention window only if it is actually shown. A discarded
    /// image is deleted, so a stale outcome never evicts the displayed file.
    pub async fn on_outcome(&self, token: RequestToken, outcome: RequestOutcome) -> Delivery {
        let prepared = if self.is_stale(token) {
            Prepared::Stale
        } else {
            match outcome {
                RequestOutcome::Success { payload, snapshot } => {
                    match self.artifacts.write(&payload).await {
                        Ok(artifact) => {
                            Prepared::Image(artifact, VisualState::from_snapshot(&snapshot))
                        }
                        Err(e) => Prepared::Error(format!("failed to store image: {}", e)),
                    }
                }
                RequestOutcome::Failure { message } => Prepared::Error(message),
            }
        };

        let (delivery, unused) = self.apply(token, prepared);
        if !unused.is_empty() {
            self.artifacts.discard(&unused).await;
        }

        let mut surface = self.surface.lock();
        surface.in_flight = surface.in_flight.saturating_sub(1);
        if surface.in_flight == 0 {
            surface.view.set_busy(false);
            self.state.send_replace(RenderState::Idle);
        }

        delivery
    }

    /// Update the view under the surface lock
    ///
    /// Returns the delivery and the files that are no longer displayed.
    fn apply(&self, token: RequestToken, prepared: Prepared) -> (Delivery, Vec<PathBuf>) {
        let mut surface = self.surface.lock();

        // A newer request may have been dispatched while the artifact was written
        let stale = matches!(prepared, Prepared::Stale)
            || (self.policy == StalePolicy::LastTriggered && token.0 < surface.latest);

        if stale {
            debug!(
                "Discarding outcome of request {} (latest is {})",
                token.0, surface.latest
            );
            self.discarded.fetch_add(1, Ordering::Relaxed);
            let unused = match prepared {
                Prepared::Image(artifact, _) => vec![artifact.path],
                _ => Vec::new(),
            };
            return (Delivery::Discarded, unused);
        }

        match prepared {
            Prepared::Image(artifact, visual) => {
                info!(
                    "Showing {} ({} bytes) for request {}",
                    artifact.path.display(),
                    artifact.len,
                    token.0
                );
                // Commit order matches display order, so the displayed file is never expired
                let expired = self.artifacts.commit(&artifact);
                surface.view.show_artifact(&artifact, &visual.style);
                surface.view.set_hint_opacity(visual.hint);
                surface.view.show_settings();
                self.shown.fetch_add(1, Ordering::Relaxed);
                (Delivery::Shown, expired)
            }
            Prepared::Error(message) => {
                warn!("Request {} failed: {}", token.0, message);
                surface.view.hide_artifact();
                surface.view.hide_settings();
                surface.view.show_error(&message);
                self.failed.fetch_add(1, Ordering::Relaxed);
                (Delivery::Failed, Vec::new())
            }
            Prepared::Stale => (Delivery::Discarded, Vec::new()),
        }
    }

    fn is_stale(&self, token: RequestToken) -> bool {
        self.policy == StalePolicy::LastTriggered && token.0 < self.surface.lock().latest
    }

    pub fn state(&self) -> RenderState {
        *self.state.borrow()
    }

    /// Resolve once no request is awaiting its result
    pub async fn wait_idle(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|state| *state == RenderState::Idle).await;
    }

    /// Run `f` against the view
    pub fn with_view<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.surface.lock().view)
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats {
            shown: self.shown.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{svg_payload, RecordingView, ViewEvent};
    use std::sync::Arc;
    use sv_core::{FormSnapshot, HintOpacity};
    use tempfile::TempDir;

    fn controller(temp_dir: &TempDir, policy: StalePolicy) -> RenderController<RecordingView> {
        RenderController::new(
            RecordingView::default(),
            ArtifactStore::new(temp_dir.path(), 4),
            policy,
        )
    }

    fn success(pairs: &[(&str, &str)]) -> RequestOutcome {
        RequestOutcome::Success {
            payload: svg_payload(),
            snapshot: FormSnapshot::from_pairs(pairs.iter().copied()),
        }
    }

    #[tokio::test]
    async fn test_success_renders_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let controller = controller(&temp_dir, StalePolicy::LastTriggered);

        let token = controller.begin();
        let delivery = controller
            .on_outcome(token, success(&[("background", "#00ff00"), ("func", "sinc")]))
            .await;

        assert_eq!(delivery, Delivery::Shown);
        controller.with_view(|view| {
            assert!(view.artifact_visible);
            assert!(view.settings_visible);
            assert_eq!(view.background_color.as_deref(), Some("#00ff00"));
            assert_eq!(view.border_color.as_deref(), Some("#00ff00"));
            assert_eq!(view.hint, HintOpacity::HIDDEN);
            assert!(view.error.is_none());
            let source = view.source.as_ref().unwrap();
            assert!(source.exists());
        });
    }

    #[tokio::test]
    async fn test_saddle_sets_faint_hint() {
        let temp_dir = TempDir::new().unwrap();
        let controller = controller(&temp_dir, StalePolicy::LastTriggered);

        let token = controller.begin();
        controller
            .on_outcome(token, success(&[("func", "saddle")]))
            .await;

        controller.with_view(|view| assert_eq!(view.hint.percent(), 25));
    }

    #[tokio::test]
    async fn test_failure_hides_and_shows_error() {
        let temp_dir = TempDir::new().unwrap();
        let controller = controller(&temp_dir, StalePolicy::LastTriggered);

        let token = controller.begin();
        controller
            .on_outcome(token, success(&[("background", "#fff")]))
            .await;

        let token = controller.begin();
        let delivery = controller
            .on_outcome(token, RequestOutcome::failure("bad request"))
            .await;

        assert_eq!(delivery, Delivery::Failed);
        controller.with_view(|view| {
            assert!(!view.artifact_visible);
            assert!(!view.settings_visible);
            assert_eq!(view.error.as_deref(), Some("bad request"));
        });
    }

    #[tokio::test]
    async fn test_begin_clears_error() {
        let temp_dir = TempDir::new().unwrap();
        let controller = controller(&temp_dir, StalePolicy::LastTriggered);

        let token = controller.begin();
        controller
            .on_outcome(token, RequestOutcome::failure("boom"))
            .await;
        controller.with_view(|view| assert!(view.error.is_some()));

        controller.begin();
        controller.with_view(|view| {
            assert!(view.error.is_none());
            assert_eq!(view.events.last(), Some(&ViewEvent::Busy(true)));
        });
    }

    #[tokio::test]
    async fn test_state_machine() {
        let temp_dir = TempDir::new().unwrap();
        let controller = controller(&temp_dir, StalePolicy::LastArrived);
        assert_eq!(controller.state(), RenderState::Idle);

        let first = controller.begin();
        let second = controller.begin();
        assert_eq!(controller.state(), RenderState::AwaitingResult);

        controller.on_outcome(first, success(&[])).await;
        assert_eq!(controller.state(), RenderState::AwaitingResult);

        controller.on_outcome(second, success(&[])).await;
        assert_eq!(controller.state(), RenderState::Idle);

        let busy: Vec<_> = controller.with_view(|view| {
            view.events
                .iter()
                .filter(|event| matches!(event, ViewEvent::Busy(_)))
                .cloned()
                .collect()
        });
        assert_eq!(busy, vec![ViewEvent::Busy(true), ViewEvent::Busy(false)]);
    }

    #[tokio::test]
    async fn test_last_triggered_discards_older_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let controller = controller(&temp_dir, StalePolicy::LastTriggered);

        let older = controller.begin();
        let newer = controller.begin();

        controller
            .on_outcome(newer, success(&[("background", "#222222")]))
            .await;
        let delivery = controller
            .on_outcome(older, success(&[("background", "#111111")]))
            .await;

        assert_eq!(delivery, Delivery::Discarded);
        controller.with_view(|view| {
            assert_eq!(view.background_color.as_deref(), Some("#222222"));
        });
        assert_eq!(controller.stats().discarded, 1);
        assert_eq!(controller.state(), RenderState::Idle);
        // Stale payloads are never written
        assert_eq!(controller.artifacts().retained().len(), 1);
    }

    #[tokio::test]
    async fn test_last_arrived_renders_every_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let controller = controller(&temp_dir, StalePolicy::LastArrived);

        let older = controller.begin();
        let newer = controller.begin();

        controller
            .on_outcome(newer, success(&[("background", "#222222")]))
            .await;
        let delivery = controller
            .on_outcome(older, success(&[("background", "#111111")]))
            .await;

        assert_eq!(delivery, Delivery::Shown);
        controller.with_view(|view| {
            assert_eq!(view.background_color.as_deref(), Some("#111111"));
        });
        assert_eq!(controller.stats().shown, 2);
    }

    #[tokio::test]
    async fn test_stale_failure_is_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let controller = controller(&temp_dir, StalePolicy::LastTriggered);

        let older = controller.begin();
        let newer = controller.begin();
        controller.on_outcome(newer, success(&[])).await;
        controller
            .on_outcome(older, RequestOutcome::failure("late failure"))
            .await;

        controller.with_view(|view| {
            assert!(view.error.is_none());
            assert!(view.artifact_visible);
        });
    }

    #[tokio::test]
    async fn test_store_failure_renders_as_error() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the artifact directory should be
        let blocker = temp_dir.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();

        let controller = RenderController::new(
            RecordingView::default(),
            ArtifactStore::new(&blocker, 1),
            StalePolicy::LastTriggered,
        );

        let token = controller.begin();
        let delivery = controller.on_outcome(token, success(&[])).await;

        assert_eq!(delivery, Delivery::Failed);
        controller.with_view(|view| {
            assert!(view.error.as_deref().unwrap().starts_with("failed to store image"));
            assert!(!view.artifact_visible);
        });
    }

    fn files_in(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_outcome_superseded_while_writing_keeps_displayed_file() {
        let temp_dir = TempDir::new().unwrap();
        let controller = RenderController::new(
            RecordingView::default(),
            ArtifactStore::new(temp_dir.path(), 1),
            StalePolicy::LastTriggered,
        );

        // Start the older outcome and leave it suspended inside its file write
        let older = controller.begin();
        let mut older_outcome =
            Box::pin(controller.on_outcome(older, success(&[("background", "#111111")])));
        let finished_early = tokio::select! {
            biased;
            delivery = &mut older_outcome => Some(delivery),
            _ = tokio::task::yield_now() => None,
        };

        let newer = controller.begin();
        let newer_delivery = controller
            .on_outcome(newer, success(&[("background", "#222222")]))
            .await;
        let older_delivery = match finished_early {
            Some(delivery) => delivery,
            None => older_outcome.await,
        };

        assert_eq!(newer_delivery, Delivery::Shown);
        assert_ne!(older_delivery, Delivery::Failed);
        controller.with_view(|view| {
            assert_eq!(view.background_color.as_deref(), Some("#222222"));
            let source = view.source.as_ref().unwrap();
            assert!(source.exists());
            assert_eq!(controller.artifacts().retained(), vec![source.clone()]);
        });
        assert_eq!(files_in(temp_dir.path()), 1);
        assert_eq!(controller.state(), RenderState::Idle);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_outcomes_never_evict_displayed_file() {
        for _ in 0..100 {
            let temp_dir = TempDir::new().unwrap();
            let controller = Arc::new(RenderController::new(
                RecordingView::default(),
                ArtifactStore::new(temp_dir.path(), 1),
                StalePolicy::LastTriggered,
            ));

            let older = controller.begin();
            let racing = {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    controller
                        .on_outcome(older, success(&[("background", "#111111")]))
                        .await
                })
            };
            tokio::task::yield_now().await;

            let newer = controller.begin();
            let newer_delivery = controller
                .on_outcome(newer, success(&[("background", "#222222")]))
                .await;
            let older_delivery = racing.await.unwrap();

            assert_eq!(newer_delivery, Delivery::Shown);
            assert_ne!(older_delivery, Delivery::Failed);
            controller.with_view(|view| {
                assert_eq!(view.background_color.as_deref(), Some("#222222"));
                let source = view.source.as_ref().unwrap();
                assert!(source.exists(), "displayed artifact was evicted");
                assert_eq!(controller.artifacts().retained(), vec![source.clone()]);
            });
            assert_eq!(files_in(temp_dir.path()), 1);
            assert_eq!(controller.state(), RenderState::Idle);
        }
    }

    #[tokio::test]
    async fn test_last_arrived_keeps_only_latest_shown_file() {
        let temp_dir = TempDir::new().unwrap();
        let controller = RenderController::new(
            RecordingView::default(),
            ArtifactStore::new(temp_dir.path(), 1),
            StalePolicy::LastArrived,
        );

        let older = controller.begin();
        let newer = controller.begin();
        controller
            .on_outcome(newer, success(&[("background", "#222222")]))
            .await;
        controller
            .on_outcome(older, success(&[("background", "#111111")]))
            .await;

        controller.with_view(|view| {
            assert_eq!(view.background_color.as_deref(), Some("#111111"));
            assert!(view.source.as_ref().unwrap().exists());
        });
        assert_eq!(files_in(temp_dir.path()), 1);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_when_settled() {
        let temp_dir = TempDir::new().unwrap();
        let controller = controller(&temp_dir, StalePolicy::LastTriggered);

        controller.wait_idle().await;

        let token = controller.begin();
        let (_, delivery) = tokio::join!(
            controller.wait_idle(),
            controller.on_outcome(token, success(&[]))
        );
        assert_eq!(delivery, Delivery::Shown);
        assert_eq!(controller.state(), RenderState::Idle);
    }
}
