//! Interactive session: edit the form on stdin, see renders as they land

use super::RenderArgs;
use crate::system_config::SystemConfig;
use crate::util;
use crate::view::TerminalView;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use pipeline::{Session, StalePolicy};
use std::sync::Arc;
use sv_core::FormSource;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// `name=value`
    Set(String, String),
    /// `-name`
    Remove(String),
    /// `:show`
    Show,
    /// `:state`
    State,
    /// `:flush`
    Flush,
    /// `:quit`, `:q`
    Quit,
    /// Blank line
    Empty,
}

/// Parse one input line
pub fn parse_input(line: &str) -> Result<Input> {
    let line = line.trim();

    match line {
        "" => return Ok(Input::Empty),
        ":show" => return Ok(Input::Show),
        ":state" => return Ok(Input::State),
        ":flush" => return Ok(Input::Flush),
        ":quit" | ":q" => return Ok(Input::Quit),
        _ => {}
    }

    if line.starts_with(':') {
        anyhow::bail!("Unknown command {:?} (try :show, :state, :flush, :quit)", line);
    }

    if let Some(name) = line.strip_prefix('-') {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Missing field name after '-'");
        }
        return Ok(Input::Remove(name.to_string()));
    }

    let (name, value) = util::parse_assignment(line)?;
    Ok(Input::Set(name, value))
}

pub async fn run(
    mut config: SystemConfig,
    args: RenderArgs,
    delay_ms: Option<u64>,
    last_arrived: bool,
) -> Result<()> {
    args.apply(&mut config);
    if let Some(delay_ms) = delay_ms {
        config.debounce.delay_ms = delay_ms;
    }
    if last_arrived {
        config.render.stale_policy = StalePolicy::LastArrived;
    }
    config.validate().context("Invalid configuration")?;

    let form = Arc::new(util::initial_form(&config, &args.set)?);
    let pipeline = util::build_pipeline(&config, TerminalView::stdout())?;
    let session = Session::new(Arc::clone(&form), pipeline, config.debounce.delay())?;

    println!(
        "{} {} (debounce {}ms, output {})",
        "Rendering via".bold(),
        config.service.endpoint.cyan(),
        config.debounce.delay_ms,
        config.render.output_dir().display().dimmed()
    );
    println!("{}", "Edit with name=value, remove with -name; :show :state :flush :quit".dimmed());

    session.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                None
            }
        };

        let Some(line) = line else {
            break;
        };

        match parse_input(&line) {
            Ok(Input::Set(name, value)) => {
                debug!("{} = {}", name, value);
                form.set(name, value);
                session.notify_change();
            }
            Ok(Input::Remove(name)) => {
                if form.remove(&name).is_some() {
                    session.notify_change();
                } else {
                    println!("{} no field {:?}", "!".yellow(), name);
                }
            }
            Ok(Input::Show) => {
                for (name, value) in form.capture_snapshot().iter() {
                    println!("  {} = {}", name.cyan(), value);
                }
            }
            Ok(Input::State) => {
                let description = session.controller().with_view(|view| view.describe());
                println!("{}", description);
                println!("pending: {}", session.is_pending());
            }
            Ok(Input::Flush) => {
                if !session.flush() {
                    println!("{}", "Nothing pending".dimmed());
                }
            }
            Ok(Input::Quit) => break,
            Ok(Input::Empty) => {}
            Err(e) => println!("{} {}", "!".yellow(), e),
        }
    }

    // Pending edits still deserve a render before exit
    session.settle().await;

    let stats = session.controller().stats();
    info!(
        "Session finished: {} shown, {} failed, {} discarded",
        stats.shown, stats.failed, stats.discarded
    );
    Ok(())
}
