//! xemad - XEMA station scraper
//!
//! This binary coordinates:
//! - Loading the station list and resolver tuning
//! - Resolving the latest period (and yesterday's fallback) for every station
//! - Writing one run report per run to the output directory

mod config;
mod scheduler;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use xema_config::AppConfig;
use xema_core::{DailySummarySource, Sink, SystemClock};
use xema_ingest::{DailySummaryAdapter, MeteocatSource};
use xema_resolve::TokioPacer;
use xema_sinks::FsSink;

use crate::config::DaemonConfig;
use crate::scheduler::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    xema_obs::init("xemad");

    // Without a station list there is nothing to do
    let app = AppConfig::load().context("Failed to load station configuration")?;
    let daemon = DaemonConfig::from_env()?;
    info!(
        stations = app.stations.len(),
        workers = daemon.workers,
        output_dir = %daemon.output_dir.display(),
        "configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(app.request_timeout())
        .user_agent(concat!("xemad/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let source = Arc::new(MeteocatSource::new(client.clone(), &app.source.base_url)?);
    let mut scheduler = Scheduler::new(
        source,
        Arc::new(TokioPacer),
        Arc::new(SystemClock),
        app.stations.clone(),
        app.resolver_settings(),
    )
    .with_workers(daemon.workers)
    .with_deadline(daemon.run_deadline);
    if app.daily.enabled {
        let daily: Arc<dyn DailySummarySource> = Arc::new(DailySummaryAdapter::new(
            client,
            &app.source.base_url,
            app.daily_query_time(),
        )?);
        scheduler = scheduler.with_daily(daily);
    }

    let mut sink = FsSink::new(&daemon.output_dir)?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            report = scheduler.run_once() => {
                if let Err(e) = sink.emit(&report).await {
                    // a one-shot run has nothing left to retry
                    if daemon.run_interval.is_none() {
                        return Err(e.context("Failed to write run report"));
                    }
                    error!(error = %e, "failed to write run report");
                }
            }
            _ = &mut shutdown => {
                info!("shutdown signal received, abandoning current run");
                break;
            }
        }

        let Some(interval) = daemon.run_interval else {
            break;
        };
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    info!("xemad stopped");
    Ok(())
}

/// Resolves on Ctrl+C; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
