//! Dashboard monitor - monitoring core daemon
//!
//! Polls the dashboard backend (or an in-process fake), classifies health and
//! serves the current state, simulation controls and alerts over HTTP.

use anyhow::{Context, Result};
use monitor_lib::{
    deploy::{DeploySource, DeployWatcher},
    HttpSampleSource, InMemorySampleSource, Monitor, SampleSource, SessionId,
};
use monitor_server::{api, config};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting dashboard monitor");

    let config = config::ServerConfig::load()?;
    info!(instance = %config.instance_name, port = config.api_port, "Monitor configured");

    let (source, deploys, source_label): (Arc<dyn SampleSource>, Arc<dyn DeploySource>, &str) =
        match &config.source_url {
            Some(url) => {
                let http = Arc::new(
                    HttpSampleSource::new(url)
                        .with_context(|| format!("invalid MONITOR_SOURCE_URL '{}'", url))?,
                );
                (http.clone() as Arc<dyn SampleSource>, http as Arc<dyn DeploySource>, "http")
            }
            None => {
                let memory = Arc::new(InMemorySampleSource::new());
                (memory.clone() as Arc<dyn SampleSource>, memory as Arc<dyn DeploySource>, "in_memory")
            }
        };

    let monitor_config = config.monitor_config();
    let poll_interval_secs = monitor_config.poll_interval.as_secs();
    let monitor = Monitor::new(source, monitor_config);
    monitor.register_health().await;
    monitor
        .logger()
        .log_startup(MONITOR_VERSION, source_label, poll_interval_secs);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    if let Some(session) = &config.session_id {
        monitor.attach_session(SessionId::new(session.as_str())).await;
    }

    let watcher_handle = config.deploy_session_id.clone().map(|session| {
        let watcher = DeployWatcher::new(deploys).with_interval(config.deploy_poll_interval());
        let monitor = monitor.clone();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            watcher
                .watch(SessionId::new(session), &monitor, shutdown)
                .await
        })
    });

    // Mark ready after initialization
    monitor.health().set_ready(true).await;

    let app_state = Arc::new(api::AppState::new(monitor.clone()));
    let mut api_shutdown = shutdown_tx.subscribe();
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state, async move {
        let _ = api_shutdown.recv().await;
    }));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    monitor.logger().log_shutdown("SIGINT received");
    let _ = shutdown_tx.send(());
    monitor.shutdown();

    if let Some(handle) = watcher_handle {
        if let Err(e) = handle.await {
            error!(error = %e, "Deploy watcher task failed");
        }
    }
    match api_handle.await {
        Ok(Err(e)) => error!(error = %e, "API server error"),
        Err(e) => error!(error = %e, "API server task failed"),
        Ok(Ok(())) => {}
    }

    info!("Shutdown complete");
    Ok(())
}
