//! Monitoring poller
//!
//! Fetches the latest sample for the attached session once on start and then
//! on a fixed interval, classifies it and publishes the result. Every start
//! and stop bumps a generation counter; a fetch that completes after its
//! generation has ended is dropped instead of published.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::health::{components, HealthRegistry};
use crate::models::SessionId;
use crate::observability::{MonitorMetrics, StructuredLogger};
use crate::source::SampleSource;
use crate::state::MonitoringStore;

/// Default time between two fetches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for the monitoring poller
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between fetches (default: 5 seconds)
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Default)]
struct PollerControl {
    generation: u64,
    running: bool,
    task: Option<JoinHandle<()>>,
}

struct PollerShared {
    source: Arc<dyn SampleSource>,
    store: MonitoringStore,
    health: HealthRegistry,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
    config: PollerConfig,
    control: Mutex<PollerControl>,
}

/// Outcome of a single fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    /// Sample classified and published
    Published,
    /// The poller was stopped while the fetch was in flight
    Discarded,
    /// The fetch failed; the previous state stays published
    Failed,
}

/// Handle to the recurring fetch task
///
/// Clones share the same task and state.
#[derive(Clone)]
pub struct MonitoringPoller {
    shared: Arc<PollerShared>,
}

impl MonitoringPoller {
    pub fn new(
        source: Arc<dyn SampleSource>,
        store: MonitoringStore,
        health: HealthRegistry,
        metrics: MonitorMetrics,
        logger: StructuredLogger,
        config: PollerConfig,
    ) -> Self {
        Self {
            shared: Arc::new(PollerShared {
                source,
                store,
                health,
                metrics,
                logger,
                config,
                control: Mutex::new(PollerControl::default()),
            }),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.shared.config
    }

    pub fn is_running(&self) -> bool {
        self.shared.control.lock().running
    }

    /// Start polling the attached session
    ///
    /// Fetches once before returning, then keeps fetching every interval in a
    /// background task. Returns false without fetching when already running,
    /// when no session is attached or while a simulation is active.
    pub async fn start(&self) -> bool {
        let (session, generation) = {
            let mut control = self.shared.control.lock();
            if control.running {
                return false;
            }
            let Some(session) = self.shared.store.session() else {
                debug!("No session attached, monitoring stays inactive");
                return false;
            };
            if self.shared.store.is_simulating() {
                debug!("Simulation active, poller stays paused");
                return false;
            }
            control.generation += 1;
            control.running = true;
            (session, control.generation)
        };

        info!(
            session = %session,
            interval_secs = self.shared.config.interval.as_secs(),
            "Starting monitoring poller"
        );
        self.shared.health.set_healthy(components::POLLER).await;

        self.shared.poll(&session, generation).await;

        let mut control = self.shared.control.lock();
        if control.generation == generation {
            let shared = Arc::clone(&self.shared);
            control.task = Some(tokio::spawn(shared.run(session, generation)));
        }
        true
    }

    /// Stop polling
    ///
    /// Once this returns no further sample is published, even from a fetch
    /// that is still in flight. Returns false if the poller was not running.
    pub fn stop(&self) -> bool {
        let mut control = self.shared.control.lock();
        control.generation += 1;
        if let Some(task) = control.task.take() {
            task.abort();
        }
        let was_running = std::mem::replace(&mut control.running, false);
        if was_running {
            info!("Stopped monitoring poller");
        }
        was_running
    }

    /// Fetch and publish once outside the schedule
    ///
    /// Used for on-demand refreshes. Does nothing while a simulation owns the
    /// published state or when no session is attached.
    pub async fn poll_once(&self) -> Option<PollOutcome> {
        let session = self.shared.store.session()?;
        if self.shared.store.is_simulating() {
            return None;
        }
        let generation = self.shared.control.lock().generation;
        Some(self.shared.poll(&session, generation).await)
    }
}

impl PollerShared {
    async fn run(self: Arc<Self>, session: SessionId, generation: u64) {
        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if self.control.lock().generation != generation {
                break;
            }
            self.poll(&session, generation).await;
        }
    }

    async fn poll(&self, session: &SessionId, generation: u64) -> PollOutcome {
        let start = Instant::now();
        let result = self.source.fetch_monitoring(session).await;
        self.metrics
            .observe_fetch_latency(start.elapsed().as_secs_f64());

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.metrics.inc_poll_errors();
                self.logger.log_poll_failure(session, &e.to_string());
                self.health.record_fetch_failure(&e.to_string()).await;
                return PollOutcome::Failed;
            }
        };

        // Publish under the control lock so a concurrent stop() either sees
        // this sample published or prevents it entirely.
        let (classification, new_alerts, alerts) = {
            let control = self.control.lock();
            if control.generation != generation || self.store.is_simulating() {
                return PollOutcome::Discarded;
            }
            let classification = self.store.publish(snapshot.metrics);
            // An empty list from the source leaves the stored alerts alone
            let new_alerts = if snapshot.alerts.is_empty() {
                Vec::new()
            } else {
                self.store.set_alerts(snapshot.alerts)
            };
            (classification, new_alerts, self.store.snapshot().alerts)
        };

        self.metrics.inc_polls();
        self.metrics.set_health(&classification);
        self.metrics
            .set_alerts(alerts.len(), alerts.unacknowledged().count());
        self.logger.log_classification(session, &classification);
        for alert in &new_alerts {
            self.logger.log_alert_raised(alert);
        }
        self.health.record_fetch_success().await;

        PollOutcome::Published
    }
}
