use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{error, info};

use events_sync_core::fetch::HttpEventSource;
use events_sync_core::synchronise::{synchronise, SyncReport};

use crate::diagnose::diagnose;
use crate::load_config::{load_config, AppConfig};
use crate::store::SqliteEventStore;

/// Message returned to callers when a run fails; details go to the log only.
pub const SYNC_FAILED_MESSAGE: &str = "Failed to sync events";

/// CLI for events-sync: pull council events into the local store.
#[derive(Parser)]
#[clap(
    name = "events-sync",
    version,
    about = "Incrementally synchronise council open-data events into a SQLite store"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one incremental sync and print the result as JSON
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Run a sync on a fixed interval until interrupted
    Watch {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Seconds between runs
        #[clap(long, default_value_t = 3600, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: u64,
    },
    /// Check the store and the upstream API and print a JSON report
    Diagnose {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Only check the store
        #[clap(long)]
        skip_api: bool,
    },
}

/// Opens the store and API client described by `config` and runs one sync.
pub async fn sync_once(config: &AppConfig) -> Result<SyncReport> {
    let store = SqliteEventStore::open(&config.store.path)
        .with_context(|| format!("Failed to open store {:?}", config.store.path))?;
    let source = HttpEventSource::new(config.api.base_url.clone())?;
    let report = synchronise(&source, &store, &config.sync).await?;
    Ok(report)
}

/// Ticker for `watch`. A run that overruns the interval pushes the next one
/// back instead of triggering a burst of catch-up runs.
pub fn watch_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync { config } => {
            let config = load_config(config)?;
            match sync_once(&config).await {
                Ok(report) => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Ok(())
                }
                Err(e) => {
                    error!(error = %e, "[SYNC][ERROR] Synchronisation failed");
                    println!("{}", json!({ "error": SYNC_FAILED_MESSAGE }));
                    Err(e.context(SYNC_FAILED_MESSAGE))
                }
            }
        }
        Commands::Watch {
            config,
            interval_secs,
        } => {
            let config = load_config(config)?;
            let mut ticker = watch_ticker(Duration::from_secs(interval_secs));
            info!(interval_secs, "[WATCH] Starting scheduled synchronisation");
            loop {
                ticker.tick().await;
                match sync_once(&config).await {
                    Ok(report) => info!(count = report.count, message = %report.message, "[WATCH] Run complete"),
                    // A failed run does not stop the schedule.
                    Err(e) => error!(error = %e, "[WATCH][ERROR] Run failed"),
                }
            }
        }
        Commands::Diagnose { config, skip_api } => {
            let config = load_config(config)?;
            // Opened without schema bootstrap so a missing table is reported, not created.
            let conn = Connection::open(&config.store.path)
                .with_context(|| format!("Failed to open store {:?}", config.store.path))?;
            let store = SqliteEventStore::from_existing(conn);
            let source = if skip_api {
                None
            } else {
                Some(HttpEventSource::new(config.api.base_url.clone())?)
            };
            let report = diagnose(&store, source.as_ref()).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}
