//! Configuration management command
//!
//! Provides CLI interface to view and edit the configuration file.

use crate::system_config::{self, FormDefaults, SystemConfig};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use pipeline::StalePolicy;
use std::path::{Path, PathBuf};

/// List all configuration values
pub async fn run_list(path: &Path) -> Result<()> {
    let config = system_config::load(path)?;

    println!("{}", "Surfview Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), path.display().dimmed());

    println!("{}", "[service]".yellow());
    println!("  {} = {}", "endpoint".cyan(), config.service.endpoint);
    println!(
        "  {} = {} {}",
        "timeout_secs".cyan(),
        config.service.timeout_secs,
        format!("({}s)", config.service.timeout_secs).dimmed()
    );

    println!("\n{}", "[debounce]".yellow());
    println!(
        "  {} = {} {}",
        "delay_ms".cyan(),
        config.debounce.delay_ms,
        format!("({:.1}s)", config.debounce.delay_ms as f64 / 1000.0).dimmed()
    );

    println!("\n{}", "[render]".yellow());
    println!(
        "  {} = {} {}",
        "output_dir".cyan(),
        config.render.output_dir().display(),
        if config.render.output_dir.is_none() {
            "(default)".dimmed().to_string()
        } else {
            String::new()
        }
    );
    println!(
        "  {} = {}",
        "retain_artifacts".cyan(),
        config.render.retain_artifacts
    );
    println!(
        "  {} = {}",
        "stale_policy".cyan(),
        policy_name(config.render.stale_policy)
    );

    println!("\n{}", "[form]".yellow());
    for (name, value) in config.form.fields() {
        println!("  {} = {}", name.cyan(), value);
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  service.timeout_secs: 1-300");
    println!("  debounce.delay_ms: 0-60,000");
    println!("  render.retain_artifacts: 1-1,000");
    println!("  render.stale_policy: last_triggered | last_arrived");
    println!("  form.lowest, form.highest, form.background: #rgb or #rrggbb");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(path: &Path, key: &str) -> Result<()> {
    let config = system_config::load(path)?;
    println!("{}", get_value(&config, key)?);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load(path)?;

    set_value(&mut config, key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    system_config::save(path, &config)?;

    println!("{} {} = {}", "\u{2713}".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(path: &Path, create: bool) -> Result<()> {
    if create && system_config::init_if_missing(path)? {
        println!("{} Created config file at: {}", "\u{2713}".green(), path.display());
    } else if path.exists() {
        println!("{}", path.display());
    } else {
        println!("{}", path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", system_config::example_config());
    Ok(())
}

fn policy_name(policy: StalePolicy) -> &'static str {
    match policy {
        StalePolicy::LastTriggered => "last_triggered",
        StalePolicy::LastArrived => "last_arrived",
    }
}

fn get_value(config: &SystemConfig, key: &str) -> Result<String> {
    let value = match key {
        "service.endpoint" => config.service.endpoint.clone(),
        "service.timeout_secs" => config.service.timeout_secs.to_string(),
        "debounce.delay_ms" => config.debounce.delay_ms.to_string(),
        "render.output_dir" => config.render.output_dir().display().to_string(),
        "render.retain_artifacts" => config.render.retain_artifacts.to_string(),
        "render.stale_policy" => policy_name(config.render.stale_policy).to_string(),
        _ => match key.strip_prefix("form.") {
            Some(field) => config
                .form
                .get(field)
                .with_context(|| format!("Form field {:?} is not set", field))?,
            None => anyhow::bail!(
                "Unknown config key: {}. Known keys: {} (or any form.<field>)",
                key,
                known_keys().join(", ")
            ),
        },
    };
    Ok(value)
}

fn set_value(config: &mut SystemConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "service.endpoint" => config.service.endpoint = value.to_string(),
        "service.timeout_secs" => {
            config.service.timeout_secs = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "debounce.delay_ms" => {
            config.debounce.delay_ms = value
                .parse()
                .context("Invalid value: must be a non-negative integer")?;
        }
        "render.output_dir" => config.render.output_dir = Some(PathBuf::from(value)),
        "render.retain_artifacts" => {
            config.render.retain_artifacts = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "render.stale_policy" => {
            config.render.stale_policy = match value {
                "last_triggered" => StalePolicy::LastTriggered,
                "last_arrived" => StalePolicy::LastArrived,
                _ => anyhow::bail!(
                    "Invalid value: must be 'last_triggered' or 'last_arrived'"
                ),
            };
        }
        _ => match key.strip_prefix("form.") {
            Some(field) if !field.is_empty() => config.form.set(field, value)?,
            _ => anyhow::bail!(
                "Unknown config key: {}. Known keys: {} (or any form.<field>)",
                key,
                known_keys().join(", ")
            ),
        },
    }
    Ok(())
}

/// Keys accepted by `get`/`set` besides arbitrary `form.<field>`
pub fn known_keys() -> Vec<String> {
    let mut keys: Vec<String> = [
        "service.endpoint",
        "service.timeout_secs",
        "debounce.delay_ms",
        "render.output_dir",
        "render.retain_artifacts",
        "render.stale_policy",
    ]
    .iter()
    .map(|key| key.to_string())
    .collect();
    keys.extend(FormDefaults::KNOWN.iter().map(|field| format!("form.{}", field)));
    keys
}
