//! Shared utilities for CLI commands

use crate::system_config::SystemConfig;
use anyhow::{Context, Result};
use pipeline::{ArtifactStore, HttpImageService, RenderController, RequestPipeline};
use std::sync::Arc;
use sv_core::{LiveForm, ViewPort};

/// Parse a `name=value` assignment
///
/// The value may be empty or contain further `=` signs; the name may not be empty.
pub fn parse_assignment(input: &str) -> Result<(String, String)> {
    let (name, value) = input
        .split_once('=')
        .with_context(|| format!("Expected name=value, got {:?}", input))?;

    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Missing field name in {:?}", input);
    }

    Ok((name.to_string(), value.trim().to_string()))
}

/// Live form seeded from config defaults, then `--set` overrides
pub fn initial_form(config: &SystemConfig, overrides: &[String]) -> Result<LiveForm> {
    let form = LiveForm::with_fields(config.form.fields());
    for assignment in overrides {
        let (name, value) = parse_assignment(assignment)?;
        form.set(name, value);
    }
    Ok(form)
}

/// HTTP service, artifact store and controller wired into a pipeline
pub fn build_pipeline<V>(
    config: &SystemConfig,
    view: V,
) -> Result<Arc<RequestPipeline<HttpImageService, V>>>
where
    V: ViewPort + 'static,
{
    let service = HttpImageService::new(&config.service.endpoint, config.service.timeout())
        .context("Failed to create image service client")?;

    let artifacts = ArtifactStore::new(
        config.render.output_dir(),
        config.render.retain_artifacts,
    );
    let controller = Arc::new(RenderController::new(
        view,
        artifacts,
        config.render.stale_policy,
    ));

    Ok(Arc::new(RequestPipeline::new(Arc::new(service), controller)))
}
