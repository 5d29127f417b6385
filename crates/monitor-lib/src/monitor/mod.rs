//! Monitoring runtime
//!
//! This module provides:
//! - The recurring poller that feeds samples through the classifier
//! - The simulation controller that overrides live metrics
//! - `Monitor`, which wires both to one store and owns the session lifecycle

mod poller;
mod simulation;


pub use poller::{MonitoringPoller, PollOutcome, PollerConfig, DEFAULT_POLL_INTERVAL};
pub use simulation::SimulationController;

use std::sync::Arc;
use std::time::Duration;

use crate::anomaly::{HealthClassification, Scenario, DEFAULT_SIMULATION_SECS};
use crate::health::HealthRegistry;
use crate::models::{MonitoringState, SessionId};
use crate::observability::{MonitorMetrics, StructuredLogger};
use crate::source::SampleSource;
use crate::state::{MonitorEvent, MonitoringStore};

/// Configuration for the monitoring runtime
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between two fetches (default: 5 seconds)
    pub poll_interval: Duration,
    /// Simulation length when the caller gives none (default: 30 seconds)
    pub default_simulation_secs: u64,
    /// Name attached to every structured log line
    pub instance_name: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            default_simulation_secs: DEFAULT_SIMULATION_SECS,
            instance_name: "dashboard".to_string(),
        }
    }
}

/// The monitoring core: one store, one poller, one simulation controller
///
/// Created at startup; the session is attached once a deployment completes
/// and detached when the user leaves the monitoring flow.
#[derive(Clone)]
pub struct Monitor {
    store: MonitoringStore,
    poller: MonitoringPoller,
    simulation: SimulationController,
    health: HealthRegistry,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
}

impl Monitor {
    pub fn new(source: Arc<dyn SampleSource>, config: MonitorConfig) -> Self {
        Self::with_health(source, config, HealthRegistry::new())
    }

    /// Build the runtime reporting into an existing health registry
    pub fn with_health(
        source: Arc<dyn SampleSource>,
        config: MonitorConfig,
        health: HealthRegistry,
    ) -> Self {
        let store = MonitoringStore::new();
        let metrics = MonitorMetrics::new();
        let logger = StructuredLogger::new(config.instance_name.clone());

        let poller = MonitoringPoller::new(
            Arc::clone(&source),
            store.clone(),
            health.clone(),
            metrics.clone(),
            logger.clone(),
            PollerConfig {
                interval: config.poll_interval,
            },
        );
        let simulation = SimulationController::new(
            source,
            store.clone(),
            poller.clone(),
            health.clone(),
            metrics.clone(),
            logger.clone(),
            config.default_simulation_secs,
        );

        Self {
            store,
            poller,
            simulation,
            health,
            metrics,
            logger,
        }
    }

    /// Register the runtime's components as healthy
    pub async fn register_health(&self) {
        self.health.register_all().await;
    }

    pub fn store(&self) -> &MonitoringStore {
        &self.store
    }

    pub fn poller(&self) -> &MonitoringPoller {
        &self.poller
    }

    pub fn simulation(&self) -> &SimulationController {
        &self.simulation
    }

    pub fn health(&self) -> &HealthRegistry {
        &self.health
    }

    pub fn metrics(&self) -> &MonitorMetrics {
        &self.metrics
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    pub fn snapshot(&self) -> MonitoringState {
        self.store.snapshot()
    }

    /// Attach a session and start monitoring it
    ///
    /// Switching to another session ends any active simulation first.
    /// Returns whether the poller was started by this call.
    pub async fn attach_session(&self, session: SessionId) -> bool {
        if self.store.session().as_ref() != Some(&session) {
            self.poller.stop();
            self.simulation.end_for_session().await;
            self.logger.log_session_changed(Some(&session));
            self.store.set_session(Some(session));
        }
        self.poller.start().await
    }

    /// Stop monitoring and go back to the initial state
    ///
    /// Returns false if no session was attached.
    pub async fn detach_session(&self) -> bool {
        let had_session = self.store.session().is_some();
        self.poller.stop();
        self.simulation.end_for_session().await;
        self.store.reset();

        if had_session {
            self.logger.log_session_changed(None);
            self.store
                .emit(MonitorEvent::SessionChanged { session: None });
        }
        self.metrics.set_alerts(0, 0);
        had_session
    }

    /// Simulate a scenario; `None` uses the configured default duration
    pub async fn simulate(
        &self,
        scenario: Scenario,
        duration_secs: Option<u64>,
    ) -> HealthClassification {
        self.simulation.simulate(scenario, duration_secs).await
    }

    pub async fn stop_simulation(&self) -> bool {
        self.simulation.stop_simulation().await
    }

    /// Acknowledge an alert; unknown ids are ignored and return false
    pub fn acknowledge_alert(&self, id: &str) -> bool {
        let acknowledged = self.store.acknowledge_alert(id);
        if acknowledged {
            let alerts = self.store.snapshot().alerts;
            self.metrics
                .set_alerts(alerts.len(), alerts.unacknowledged().count());
        }
        acknowledged
    }

    /// Fetch once outside the schedule
    pub async fn refresh(&self) -> Option<PollOutcome> {
        self.poller.poll_once().await
    }

    /// Stop all background work without publishing anything further
    pub fn shutdown(&self) {
        self.poller.stop();
        self.simulation.cancel();
    }
}
