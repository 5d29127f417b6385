//! Simulation controller
//!
//! Overrides live metrics with a scenario preset for a fixed duration. While
//! a simulation is active the poller is stopped; ending the simulation
//! publishes the recovery sample and restarts the poller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use super::poller::MonitoringPoller;
use crate::anomaly::{recovery_sample, HealthClassification, Scenario};
use crate::health::{components, HealthRegistry};
use crate::models::{ActiveSimulation, SessionId};
use crate::observability::{MonitorMetrics, StructuredLogger};
use crate::source::{SampleSource, SourceError};
use crate::state::{MonitorEvent, MonitoringStore, StopReason};

#[derive(Default)]
struct SimulationControl {
    generation: u64,
    active: Option<ActiveSimulation>,
    timer: Option<JoinHandle<()>>,
}

struct SimulationShared {
    source: Arc<dyn SampleSource>,
    store: MonitoringStore,
    poller: MonitoringPoller,
    health: HealthRegistry,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
    default_duration_secs: u64,
    control: Mutex<SimulationControl>,
}

/// Handle to the simulation state machine (idle / simulating)
#[derive(Clone)]
pub struct SimulationController {
    shared: Arc<SimulationShared>,
}

impl SimulationController {
    pub fn new(
        source: Arc<dyn SampleSource>,
        store: MonitoringStore,
        poller: MonitoringPoller,
        health: HealthRegistry,
        metrics: MonitorMetrics,
        logger: StructuredLogger,
        default_duration_secs: u64,
    ) -> Self {
        Self {
            shared: Arc::new(SimulationShared {
                source,
                store,
                poller,
                health,
                metrics,
                logger,
                default_duration_secs,
                control: Mutex::new(SimulationControl::default()),
            }),
        }
    }

    pub fn is_active(&self) -> bool {
        self.shared.control.lock().active.is_some()
    }

    pub fn active(&self) -> Option<ActiveSimulation> {
        self.shared.control.lock().active.clone()
    }

    pub fn default_duration_secs(&self) -> u64 {
        self.shared.default_duration_secs
    }

    /// Start simulating a scenario
    ///
    /// Stops the poller, publishes the scenario preset and arms the auto-stop
    /// timer before the sample source is told; a failed notification is
    /// logged and does not undo the local state. Calling this while a
    /// simulation is active replaces the scenario and restarts the timer.
    pub async fn simulate(
        &self,
        scenario: Scenario,
        duration_secs: Option<u64>,
    ) -> HealthClassification {
        let duration_secs = duration_secs.unwrap_or(self.shared.default_duration_secs);
        let session = self.shared.store.session();

        let classification = {
            let mut control = self.shared.control.lock();
            control.generation += 1;
            if let Some(timer) = control.timer.take() {
                timer.abort();
            }

            let simulation = ActiveSimulation {
                scenario,
                duration_secs,
                started_at: Utc::now(),
            };
            // Flag first so a poller starting concurrently backs off
            self.shared.store.set_simulation(Some(simulation.clone()));
            self.shared.poller.stop();
            let classification = self.shared.store.publish(scenario.preset_sample());
            control.active = Some(simulation);

            let generation = control.generation;
            let shared = Arc::clone(&self.shared);
            control.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(duration_secs)).await;
                shared.finish(Some(generation), StopReason::Expired).await;
            }));

            classification
        };

        self.shared.store.emit(MonitorEvent::SimulationStarted {
            scenario,
            duration_secs,
        });
        self.shared.metrics.inc_simulations(scenario);
        self.shared.metrics.set_simulation_active(true);
        self.shared.metrics.set_health(&classification);
        self.shared.health.set_simulating(true).await;

        match session {
            Some(session) => {
                self.shared
                    .logger
                    .log_simulation_started(&session, scenario, duration_secs);
                let result = self
                    .shared
                    .source
                    .start_simulation(&session, scenario, Some(duration_secs))
                    .await;
                self.shared.report_notify(&session, "start", result).await;
            }
            None => {
                debug!(scenario = %scenario, "Simulating without a session, remote not notified");
            }
        }

        classification
    }

    /// Stop the active simulation and resume polling
    ///
    /// Returns false when no simulation was active.
    pub async fn stop_simulation(&self) -> bool {
        self.shared.finish(None, StopReason::Manual).await
    }

    /// End the simulation because its session is going away; polling is not resumed
    pub(crate) async fn end_for_session(&self) -> bool {
        self.shared.finish(None, StopReason::SessionEnded).await
    }

    /// Drop any active simulation without publishing or notifying
    pub fn cancel(&self) {
        let mut control = self.shared.control.lock();
        control.generation += 1;
        if let Some(timer) = control.timer.take() {
            timer.abort();
        }
        if control.active.take().is_some() {
            self.shared.store.set_simulation(None);
            self.shared.metrics.set_simulation_active(false);
        }
    }
}

impl SimulationShared {
    /// Common exit path for manual stop, expiry and session changes
    ///
    /// `expected` is the generation of the timer that fired; a stale timer is
    /// ignored. The flag is cleared before the source is notified, so a
    /// failed notification never leaves the controller stuck simulating.
    async fn finish(self: &Arc<Self>, expected: Option<u64>, reason: StopReason) -> bool {
        let (scenario, timer, classification) = {
            let mut control = self.control.lock();
            if expected.is_some_and(|generation| generation != control.generation) {
                return false;
            }
            let Some(active) = control.active.take() else {
                return false;
            };
            control.generation += 1;
            let timer = control.timer.take();

            let classification = self.store.publish(recovery_sample());
            self.store.set_simulation(None);
            (active.scenario, timer, classification)
        };

        // The timer task runs this itself on expiry and must not abort itself
        if expected.is_none() {
            if let Some(timer) = timer {
                timer.abort();
            }
        }

        let session = self.store.session();
        self.store
            .emit(MonitorEvent::SimulationStopped { scenario, reason });
        self.metrics.set_simulation_active(false);
        self.metrics.set_health(&classification);
        self.health.set_simulating(false).await;
        self.logger
            .log_simulation_stopped(session.as_ref(), scenario, reason);

        // The source must drop the scenario before polling resumes
        if let Some(session) = session {
            let result = self.source.stop_simulation(&session).await;
            self.report_notify(&session, "stop", result).await;
        }

        if reason != StopReason::SessionEnded {
            self.poller.start().await;
        }
        true
    }

    async fn report_notify(
        &self,
        session: &SessionId,
        action: &str,
        result: Result<(), SourceError>,
    ) {
        match result {
            Ok(()) => self.health.set_healthy(components::SIMULATION).await,
            Err(e) => {
                self.metrics.inc_notify_errors();
                self.logger
                    .log_notify_failure(session, action, &e.to_string());
                self.health
                    .set_degraded(components::SIMULATION, format!("{action} notification failed: {e}"))
                    .await;
            }
        }
    }
}
