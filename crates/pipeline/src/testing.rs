//! Test doubles shared by the pipeline tests

use crate::error::PipelineError;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sv_core::{Artifact, ArtifactStyle, FormSnapshot, HintOpacity, Payload, ViewPort};

pub fn svg_payload() -> Payload {
    Payload::new(Bytes::from_static(b"<svg/>"), Some("image/svg+xml".into()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ShowArtifact(PathBuf),
    HideArtifact,
    ShowSettings,
    HideSettings,
    Hint(u8),
    ShowError(String),
    ClearError,
    Busy(bool),
}

/// View that records every call and the resulting element state
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
    pub source: Option<PathBuf>,
    pub background_color: Option<String>,
    pub border_color: Option<String>,
    pub artifact_visible: bool,
    pub settings_visible: bool,
    pub hint: HintOpacity,
    pub error: Option<String>,
}

impl ViewPort for RecordingView {
    fn show_artifact(&mut self, artifact: &Artifact, style: &ArtifactStyle) {
        self.source = Some(artifact.path.clone());
        self.background_color = style.background_color.clone();
        self.border_color = style.border_color.clone();
        self.artifact_visible = true;
        self.events.push(ViewEvent::ShowArtifact(artifact.path.clone()));
    }

    fn hide_artifact(&mut self) {
        self.artifact_visible = false;
        self.events.push(ViewEvent::HideArtifact);
    }

    fn show_settings(&mut self) {
        self.settings_visible = true;
        self.events.push(ViewEvent::ShowSettings);
    }

    fn hide_settings(&mut self) {
        self.settings_visible = false;
        self.events.push(ViewEvent::HideSettings);
    }

    fn set_hint_opacity(&mut self, opacity: HintOpacity) {
        self.hint = opacity;
        self.events.push(ViewEvent::Hint(opacity.percent()));
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
        self.events.push(ViewEvent::ShowError(message.to_string()));
    }

    fn clear_error(&mut self) {
        self.error = None;
        self.events.push(ViewEvent::ClearError);
    }

    fn set_busy(&mut self, busy: bool) {
        self.events.push(ViewEvent::Busy(busy));
    }
}

/// Scripted image service
///
/// Each call pops the next `(delay, result)` step; once the script runs out
/// every call succeeds immediately. Every received snapshot is recorded.
#[derive(Default)]
pub struct FakeService {
    pub calls: Mutex<Vec<FormSnapshot>>,
    script: Mutex<VecDeque<(Duration, Result<Payload, String>)>>,
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn scripted(steps: Vec<(Duration, Result<Payload, String>)>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::default(),
            script: Mutex::new(steps.into()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl crate::service::ImageService for FakeService {
    async fn draw(&self, snapshot: &FormSnapshot) -> Result<Payload, PipelineError> {
        self.calls.lock().push(snapshot.clone());
        let step = self.script.lock().pop_front();

        let (delay, result) = step.unwrap_or((Duration::ZERO, Ok(svg_payload())));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        result.map_err(|body| PipelineError::Service { status: 400, body })
    }
}
