//! System configuration file
//!
//! Stored as TOML at `<config_dir>/surfview/config.toml`. Every key has a
//! default, so a missing file or a partial file is valid.

use anyhow::{Context, Result};
use pipeline::service::DEFAULT_ENDPOINT;
use pipeline::StalePolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sv_core::{parse_hex, ColorError};
use thiserror::Error;

/// Validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be between {min} and {max} (got {value})")]
    OutOfRange {
        key: &'static str,
        min: u64,
        max: u64,
        value: u64,
    },

    #[error("{key}: {source}")]
    Color {
        key: String,
        #[source]
        source: ColorError,
    },

    #[error("service.endpoint {0:?} is not an http(s) URL")]
    Endpoint(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SystemConfig {
    pub service: ServiceConfig,
    pub debounce: DebounceConfig,
    pub render: RenderConfig,
    pub form: FormDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Image service URL
    pub endpoint: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Quiet period before an edit triggers a request
    pub delay_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: scheduler::DEFAULT_DELAY.as_millis() as u64,
        }
    }
}

impl DebounceConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Artifact directory (defaults to the user cache directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// How many rendered images to keep on disk
    pub retain_artifacts: usize,
    /// Which outcome wins when requests overlap
    pub stale_policy: StalePolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            retain_artifacts: pipeline::artifact::DEFAULT_RETAIN,
            stale_policy: StalePolicy::default(),
        }
    }
}

impl RenderConfig {
    /// Configured artifact directory, or `<cache_dir>/surfview`
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("surfview")
        })
    }
}

/// Initial form values, matching the image service defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormDefaults {
    pub width: u32,
    pub height: u32,
    pub cells: u32,
    pub xyrange: f64,
    pub lowest: String,
    pub highest: String,
    pub func: String,
    pub background: String,
    /// Any other field, passed through to the service
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            width: 600,
            height: 320,
            cells: 100,
            xyrange: 30.0,
            lowest: "#0000ff".to_string(),
            highest: "#ff0000".to_string(),
            func: "schaffer".to_string(),
            background: "#ffffff".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

impl FormDefaults {
    /// Field names with a dedicated setting
    pub const KNOWN: [&'static str; 8] = [
        "width",
        "height",
        "cells",
        "xyrange",
        "lowest",
        "highest",
        "func",
        "background",
    ];

    /// Fields in form order, as submitted to the service
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("width".to_string(), self.width.to_string()),
            ("height".to_string(), self.height.to_string()),
            ("cells".to_string(), self.cells.to_string()),
            ("xyrange".to_string(), self.xyrange.to_string()),
            ("lowest".to_string(), self.lowest.clone()),
            ("highest".to_string(), self.highest.clone()),
            ("func".to_string(), self.func.clone()),
            ("background".to_string(), self.background.clone()),
        ];

        for (name, value) in &self.extra {
            let value = match value {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            fields.push((name.clone(), value));
        }

        fields
    }

    /// Value of one field as it would be submitted
    pub fn get(&self, name: &str) -> Option<String> {
        self.fields()
            .into_iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Set a field from its string form
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "width" => self.width = value.parse().context("width must be an integer")?,
            "height" => self.height = value.parse().context("height must be an integer")?,
            "cells" => self.cells = value.parse().context("cells must be an integer")?,
            "xyrange" => self.xyrange = value.parse().context("xyrange must be a number")?,
            "lowest" => self.lowest = value.to_string(),
            "highest" => self.highest = value.to_string(),
            "func" => self.func = value.to_string(),
            "background" => self.background = value.to_string(),
            _ => {
                self.extra
                    .insert(name.to_string(), toml::Value::String(value.to_string()));
            }
        }
        Ok(())
    }
}

impl SystemConfig {
    /// Check ranges, colors and the endpoint
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("service.timeout_secs", self.service.timeout_secs, 1, 300)?;
        check_range("debounce.delay_ms", self.debounce.delay_ms, 0, 60_000)?;
        check_range(
            "render.retain_artifacts",
            self.render.retain_artifacts as u64,
            1,
            1000,
        )?;

        match reqwest::Url::parse(&self.service.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::Endpoint(self.service.endpoint.clone())),
        }

        for (key, value) in [
            ("form.lowest", &self.form.lowest),
            ("form.highest", &self.form.highest),
            ("form.background", &self.form.background),
        ] {
            parse_hex(value).map_err(|source| ConfigError::Color {
                key: key.to_string(),
                source,
            })?;
        }

        Ok(())
    }
}

fn check_range(key: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            key,
            min,
            max,
            value,
        });
    }
    Ok(())
}

/// Default config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("surfview").join("config.toml"))
}

/// Explicit path if given, otherwise the default location
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => config_file_path().context("Could not determine config file path"),
    }
}

/// Load the config at `path`, falling back to defaults if it does not exist
pub fn load(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Write `config` to `path`, creating parent directories
pub fn save(path: &Path, config: &SystemConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Write the default config if no file exists yet
pub fn init_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save(path, &SystemConfig::default())?;
    Ok(true)
}

/// Annotated example configuration
pub fn example_config() -> &'static str {
    r##"# Surfview configuration

[service]
# Image service endpoint (multipart POST)
endpoint = "http://localhost:80/draw"
# Per-request timeout, 1-300
timeout_secs = 30

[debounce]
# Quiet period after the last edit before a request fires, 0-60000
delay_ms = 1000

[render]
# Where rendered images are written (default: user cache dir)
# output_dir = "/tmp/surfview"
# Rendered images kept on disk, 1-1000
retain_artifacts = 4
# "last_triggered" drops responses of superseded requests,
# "last_arrived" renders whichever response arrives last
stale_policy = "last_triggered"

[form]
width = 600
height = 320
cells = 100
xyrange = 30.0
lowest = "#0000ff"
highest = "#ff0000"
# schaffer, eggbox, sinc, moguls or saddle
func = "schaffer"
background = "#ffffff"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = SystemConfig::default();
        config.validate().unwrap();
        assert_eq!(config.debounce.delay(), Duration::from_millis(1000));
        assert_eq!(config.service.endpoint, "http://localhost:80/draw");
        assert_eq!(config.render.stale_policy, StalePolicy::LastTriggered);
    }

    #[test]
    fn test_example_matches_defaults() {
        let parsed: SystemConfig = toml::from_str(example_config()).unwrap();
        assert_eq!(parsed, SystemConfig::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: SystemConfig = toml::from_str(
            r#"
            [debounce]
            delay_ms = 250

            [form]
            func = "saddle"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.debounce.delay_ms, 250);
        assert_eq!(parsed.form.func, "saddle");
        assert_eq!(parsed.form.width, 600);
        assert_eq!(parsed.service, ServiceConfig::default());
    }

    #[test]
    fn test_form_fields_order_and_extras() {
        let mut form = FormDefaults::default();
        form.set("zoom", "2").unwrap();
        form.set("xyrange", "12.5").unwrap();

        let fields = form.fields();
        let names: Vec<_> = fields.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "width",
                "height",
                "cells",
                "xyrange",
                "lowest",
                "highest",
                "func",
                "background",
                "zoom",
            ]
        );
        assert_eq!(form.get("xyrange").as_deref(), Some("12.5"));
        assert_eq!(form.get("zoom").as_deref(), Some("2"));
        assert_eq!(FormDefaults::default().get("xyrange").as_deref(), Some("30"));
    }

    #[test]
    fn test_form_set_rejects_bad_numbers() {
        let mut form = FormDefaults::default();
        assert!(form.set("width", "wide").is_err());
        assert_eq!(form.width, 600);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = SystemConfig::default();
        config.debounce.delay_ms = 120_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { key: "debounce.delay_ms", .. })
        ));

        let mut config = SystemConfig::default();
        config.service.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_color_and_endpoint() {
        let mut config = SystemConfig::default();
        config.form.background = "green".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("form.background"));

        let mut config = SystemConfig::default();
        config.service.endpoint = "ftp://example.com/draw".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Endpoint(_))));
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("config.toml");

        assert_eq!(load(&path)?, SystemConfig::default());

        let mut config = SystemConfig::default();
        config.render.stale_policy = StalePolicy::LastArrived;
        config.render.output_dir = Some(temp_dir.path().join("out"));
        config.form.set("zoom", "2")?;
        save(&path, &config)?;

        assert_eq!(load(&path)?, config);
        assert!(!init_if_missing(&path)?);
        Ok(())
    }

    #[test]
    fn test_load_rejects_invalid_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[debounce]\ndelay_ms = 999999\n")?;

        assert!(load(&path).is_err());
        Ok(())
    }
}
