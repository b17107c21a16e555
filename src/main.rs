//! gt-watch - TOML configuration viewer and watcher
//!
//! Decodes a TOML file, prints it as JSON, and with `--watch` keeps
//! printing it every time the file is rewritten.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gt_utils::{ConfigStore, ReloadEvent, WatchOptions};

/// CLI arguments for gt-watch
#[derive(Parser, Debug)]
#[command(name = "gt-watch")]
#[command(about = "Decode a TOML file and follow its changes")]
#[command(version)]
#[command(long_about = "
Decode a TOML file and print it as JSON.

With --watch the file is re-read on every write and printed again
until the process receives Ctrl+C, SIGINT or SIGTERM.

Watch options priority (highest to lowest):
1. Command-line arguments
2. Environment variables
3. Options file (--options)
4. Built-in defaults

Environment variables:
  GT_WATCH_SETTLE_DELAY         - Pause before re-reading (e.g., 100ms)
  GT_WATCH_SUBSCRIPTION_FAILURE - 'return_error' or 'exit'
  GT_WATCH_EVENT_CAPACITY       - Reload event buffer size
")]
pub struct CliArgs {
    /// TOML file to decode
    #[arg(short, long, default_value = "config.toml", help = "Path to the TOML file")]
    pub config: PathBuf,

    /// Keep watching the file for changes
    #[arg(short, long, help = "Re-read the file on every write")]
    pub watch: bool,

    /// Watch options file
    #[arg(long, help = "Path to a TOML file with watch options")]
    pub options: Option<PathBuf>,

    /// Settle delay (overrides options)
    #[arg(long, value_parser = humantime::parse_duration, help = "Pause before re-reading, e.g. 250ms")]
    pub settle_delay: Option<Duration>,

    /// Exit immediately if the file cannot be watched
    #[arg(long, help = "Terminate the process when the watch cannot be established")]
    pub exit_on_watch_failure: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", help = "Log level")]
    pub log_level: String,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    init_tracing(&args)?;

    let mut options = WatchOptions::load(args.options.as_deref(), |key| std::env::var(key).ok())?;
    options.merge_with_cli_args(args.settle_delay, args.exit_on_watch_failure);
    options
        .validate()
        .context("Watch options validation failed")?;

    let store = Arc::new(ConfigStore::with_options(
        args.config.clone(),
        toml::Table::new(),
        options,
    ));

    if !args.watch {
        store
            .decode()
            .await
            .with_context(|| format!("Failed to decode {}", args.config.display()))?;
        print_config(&store).await?;
        return Ok(());
    }

    // Subscribed before the watch starts so no reload goes unprinted
    let mut events = store.subscribe();
    let handle = store
        .start_watch()
        .await
        .with_context(|| format!("Failed to watch {}", args.config.display()))?;
    info!(watch_id = %handle.id(), "Watching {}", handle.path().display());
    print_config(&store).await?;

    let printer_store = Arc::clone(&store);
    let printer = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(ReloadEvent::Reloaded { .. }) => {
                    if let Err(e) = print_config(&printer_store).await {
                        error!("Failed to print configuration: {}", e);
                    }
                }
                Ok(ReloadEvent::Failed { error, .. }) => {
                    warn!("Keeping previous configuration: {}", error);
                }
                Err(e) => {
                    warn!("Missed reload events: {}", e);
                }
            }
        }
    });

    wait_for_signal().await?;

    info!("Shutting down watch...");
    handle.stop().await;
    printer.abort();

    Ok(())
}

async fn print_config(store: &ConfigStore<toml::Table>) -> Result<()> {
    let document = table_to_json(&*store.read().await);
    let json = serde_json::to_string_pretty(&document).context("Failed to encode configuration as JSON")?;
    println!("{}", json);
    Ok(())
}

/// Convert a TOML table to JSON, rendering datetimes as RFC 3339 strings
fn table_to_json(table: &toml::Table) -> serde_json::Value {
    serde_json::Value::Object(
        table
            .iter()
            .map(|(key, value)| (key.clone(), toml_to_json(value)))
            .collect(),
    )
}

fn toml_to_json(value: &toml::Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        toml::Value::String(s) => Json::String(s.clone()),
        toml::Value::Integer(i) => Json::from(*i),
        // NaN and infinities have no JSON form
        toml::Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
        toml::Value::Boolean(b) => Json::Bool(*b),
        toml::Value::Datetime(dt) => Json::String(dt.to_string()),
        toml::Value::Array(items) => Json::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => table_to_json(table),
    }
}

/// Wait for SIGTERM, SIGINT or Ctrl+C
async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(args: &CliArgs) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    // Logs go to stderr so stdout carries only the JSON documents
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}
