//! CLI command implementations

pub mod config;
pub mod draw;
pub mod watch;

use clap::Args;
use std::path::PathBuf;

/// Options shared by commands that talk to the image service
#[derive(Debug, Clone, Default, Args)]
pub struct RenderArgs {
    /// Image service endpoint (overrides service.endpoint)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Directory for rendered images (overrides render.output_dir)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Set a form field, e.g. --set func=saddle (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,
}

impl RenderArgs {
    /// Apply command-line overrides to a loaded config
    pub fn apply(&self, config: &mut crate::system_config::SystemConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.service.endpoint = endpoint.clone();
        }
        if let Some(out) = &self.out {
            config.render.output_dir = Some(out.clone());
        }
    }
}
