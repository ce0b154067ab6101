//! One-shot render, no debounce

use super::RenderArgs;
use crate::system_config::SystemConfig;
use crate::util;
use crate::view::TerminalView;
use anyhow::{Context, Result};
use pipeline::Delivery;
use sv_core::FormSource;

pub async fn run(mut config: SystemConfig, args: RenderArgs) -> Result<()> {
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let form = util::initial_form(&config, &args.set)?;
    let pipeline = util::build_pipeline(&config, TerminalView::stdout())?;

    match pipeline.submit(form.capture_snapshot()).await {
        Delivery::Shown => Ok(()),
        // The view already printed the message
        Delivery::Failed | Delivery::Discarded => anyhow::bail!("Render failed"),
    }
}
