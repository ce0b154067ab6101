//! Surfview CLI - sv command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod cmd;
mod system_config;
mod util;
mod view;

/// Surfview - live surface renders from a debounced parameter form
#[derive(Parser)]
#[command(name = "sv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config_dir>/surfview/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render once, then re-render as fields are edited on stdin
    Watch {
        #[command(flatten)]
        render: cmd::RenderArgs,

        /// Quiet period after the last edit, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Render every response, even from superseded requests
        #[arg(long)]
        last_arrived: bool,
    },
    /// Render the form once and exit
    Draw {
        #[command(flatten)]
        render: cmd::RenderArgs,
    },
    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Print one value
    Get {
        /// Key, e.g. debounce.delay_ms or form.func
        key: String,
    },
    /// Set one value
    Set {
        key: String,
        value: String,
    },
    /// Print the config file path
    Path {
        /// Create the file with defaults if it does not exist
        #[arg(long)]
        create: bool,
    },
    /// Print an annotated example configuration
    Example,
}

/// Install the tracing subscriber
///
/// `RUST_LOG` controls filtering (default `warn`). With a log file, writes go
/// through a non-blocking appender whose guard must outlive the program.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .context("Log file path has no file name")?;

            std::fs::create_dir_all(dir).context("Failed to create log directory")?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_tracing(cli.log_file.as_deref())?;

    let config_path = system_config::resolve_path(cli.config.as_deref())?;

    match cli.command {
        Commands::Watch { render, delay_ms, last_arrived } => {
            let config = system_config::load(&config_path)?;
            cmd::watch::run(config, render, delay_ms, last_arrived).await
        }
        Commands::Draw { render } => {
            let config = system_config::load(&config_path)?;
            cmd::draw::run(config, render).await
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list(&config_path).await,
            ConfigCommands::Get { key } => cmd::config::run_get(&config_path, &key).await,
            ConfigCommands::Set { key, value } => {
                cmd::config::run_set(&config_path, &key, &value).await
            }
            ConfigCommands::Path { create } => cmd::config::run_path(&config_path, create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
