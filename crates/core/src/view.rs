//! Rendering seam and derived visual state

use crate::snapshot::FormSnapshot;
use std::path::PathBuf;

/// `func` value that reveals the hint element
pub const SADDLE: &str = "saddle";

/// Opacity of the hint element, in percent (hidden by default)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HintOpacity(u8);

impl HintOpacity {
    /// Hidden hint
    pub const HIDDEN: HintOpacity = HintOpacity(0);
    /// Faintly visible hint shown for the saddle surface
    pub const FAINT: HintOpacity = HintOpacity(25);

    pub fn percent(self) -> u8 {
        self.0
    }

    pub fn is_visible(self) -> bool {
        self.0 > 0
    }
}

/// Visual state derived from the snapshot that produced an image
///
/// Never stored on its own; always recomputed from its snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualState {
    /// Artifact background and border color
    pub style: ArtifactStyle,
    /// Hint element opacity
    pub hint: HintOpacity,
}

impl VisualState {
    pub fn from_snapshot(snapshot: &FormSnapshot) -> Self {
        let hint = match snapshot.func() {
            Some(SADDLE) => HintOpacity::FAINT,
            _ => HintOpacity::HIDDEN,
        };

        Self {
            style: ArtifactStyle::from_snapshot(snapshot),
            hint,
        }
    }
}

/// Styling applied to a shown artifact
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArtifactStyle {
    pub background_color: Option<String>,
    pub border_color: Option<String>,
}

impl ArtifactStyle {
    /// Background and border both take the `background` field
    pub fn from_snapshot(snapshot: &FormSnapshot) -> Self {
        let color = snapshot.background().map(str::to_string);
        Self {
            background_color: color.clone(),
            border_color: color,
        }
    }
}

/// A materialized, displayable reference to an image payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Where the payload was written
    pub path: PathBuf,
    /// Media type reported by the service
    pub content_type: Option<String>,
    /// Payload size in bytes
    pub len: usize,
}

/// The surface the render controller draws on
///
/// Implementations own the concrete elements (artifact container, settings
/// panel, error element, hint element). The controller is the only caller.
pub trait ViewPort: Send {
    /// Set the artifact source and style, then reveal its container
    fn show_artifact(&mut self, artifact: &Artifact, style: &ArtifactStyle);

    /// Hide the artifact container
    fn hide_artifact(&mut self);

    /// Reveal the settings panel
    fn show_settings(&mut self);

    /// Hide the settings panel
    fn hide_settings(&mut self);

    /// Set the hint element opacity
    fn set_hint_opacity(&mut self, opacity: HintOpacity);

    /// Set the error text and reveal the error element
    fn show_error(&mut self, message: &str);

    /// Hide the error element
    fn clear_error(&mut self);

    /// Called when the controller enters or leaves the awaiting state
    fn set_busy(&mut self, _busy: bool) {}
}
