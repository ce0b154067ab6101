//! Terminal rendering of request outcomes

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::Write;
use std::time::Duration;
use sv_core::{parse_hex, Artifact, ArtifactStyle, HintOpacity, ViewPort};

/// Hint shown next to the saddle surface
const SADDLE_HINT: &str = "saddle: z = x\u{b2} - y\u{b2} diverges fast, try a smaller xyrange";

/// Plays the page: artifact container, settings panel, hint and error element
pub struct TerminalView<W: Write + Send = std::io::Stdout> {
    out: W,
    /// Show a spinner while a request is in flight
    spinner_enabled: bool,
    spinner: Option<ProgressBar>,

    artifact: Option<Artifact>,
    style: ArtifactStyle,
    artifact_visible: bool,
    settings_visible: bool,
    hint: HintOpacity,
    error: Option<String>,
}

impl TerminalView {
    /// View printing to stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout(), true)
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W, spinner_enabled: bool) -> Self {
        Self {
            out,
            spinner_enabled,
            spinner: None,
            artifact: None,
            style: ArtifactStyle::default(),
            artifact_visible: false,
            settings_visible: false,
            hint: HintOpacity::HIDDEN,
            error: None,
        }
    }

    /// One-line-per-element summary of what is currently visible
    pub fn describe(&self) -> String {
        let artifact = match (&self.artifact, self.artifact_visible) {
            (Some(artifact), true) => artifact.path.display().to_string(),
            (Some(_), false) => "hidden".to_string(),
            (None, _) => "none".to_string(),
        };
        let color = self.style.background_color.as_deref().unwrap_or("-");

        format!(
            "artifact: {}\nbackground: {}\nborder: {}\nsettings: {}\nhint: {}%\nerror: {}",
            artifact,
            color,
            self.style.border_color.as_deref().unwrap_or("-"),
            if self.settings_visible { "visible" } else { "hidden" },
            self.hint.percent(),
            self.error.as_deref().unwrap_or("-"),
        )
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // Output is best-effort; a closed stdout must not take the session down
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| {
                let _ = writeln!(self.out, "{}", text);
            }),
            None => {
                let _ = writeln!(self.out, "{}", text);
            }
        }
    }
}

impl<W: Write + Send> ViewPort for TerminalView<W> {
    fn show_artifact(&mut self, artifact: &Artifact, style: &ArtifactStyle) {
        self.artifact = Some(artifact.clone());
        self.style = style.clone();
        self.artifact_visible = true;

        let swatch = match style.background_color.as_deref().map(parse_hex) {
            Some(Ok(rgb)) => format!(" {}", "    ".on_truecolor(rgb.r, rgb.g, rgb.b)),
            _ => String::new(),
        };
        let content_type = artifact.content_type.as_deref().unwrap_or("unknown type");

        let text = format!(
            "{} {} ({} bytes, {}){}",
            "\u{2713}".green(),
            artifact.path.display(),
            artifact.len,
            content_type.dimmed(),
            swatch
        );
        self.line(&text);
    }

    fn hide_artifact(&mut self) {
        self.artifact_visible = false;
    }

    fn show_settings(&mut self) {
        self.settings_visible = true;
    }

    fn hide_settings(&mut self) {
        self.settings_visible = false;
    }

    fn set_hint_opacity(&mut self, opacity: HintOpacity) {
        self.hint = opacity;
        if opacity.is_visible() {
            let text = format!("  {}", SADDLE_HINT.dimmed());
            self.line(&text);
        }
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
        let text = format!("{} {}", "\u{2717}".red(), message.red());
        self.line(&text);
    }

    fn clear_error(&mut self) {
        self.error = None;
    }

    fn set_busy(&mut self, busy: bool) {
        if !self.spinner_enabled {
            return;
        }

        if busy {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message("rendering...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            self.spinner = Some(spinner);
        } else if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}
