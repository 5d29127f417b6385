//! Shared monitoring state container
//!
//! Holds the single "current sample + classification + alerts" state. The
//! latest state is observable through a `watch` channel and UI-facing events
//! (coach transitions, new alerts, simulation edges) go out on a broadcast
//! channel.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

use crate::anomaly::{classify, HealthClassification, Scenario};
use crate::models::{ActiveSimulation, Alert, MetricSample, MonitoringState, SessionId};

/// Capacity of the event channel before slow subscribers start lagging
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Why a simulation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Explicit stop request
    Manual,
    /// The scenario duration elapsed
    Expired,
    /// The session was detached or replaced
    SessionEnded,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Manual => write!(f, "manual"),
            StopReason::Expired => write!(f, "expired"),
            StopReason::SessionEnded => write!(f, "session_ended"),
        }
    }
}

/// Events for the presentation layer (toasts, coach bubble, alert badges)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Health state or coach message changed
    Classified {
        classification: HealthClassification,
    },
    AlertRaised {
        alert: Alert,
    },
    SimulationStarted {
        scenario: Scenario,
        duration_secs: u64,
    },
    SimulationStopped {
        scenario: Scenario,
        reason: StopReason,
    },
    SessionChanged {
        session: Option<SessionId>,
    },
}

/// Handle to the published monitoring state
///
/// Clones share the same underlying state.
#[derive(Clone)]
pub struct MonitoringStore {
    state: Arc<watch::Sender<MonitoringState>>,
    events: broadcast::Sender<MonitorEvent>,
}

impl Default for MonitoringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitoringStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(MonitoringState::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(state),
            events,
        }
    }

    /// Classify a sample and make it the current state
    pub fn publish(&self, sample: MetricSample) -> HealthClassification {
        let classification = classify(&sample);
        let mut transitioned = false;

        self.state.send_modify(|state| {
            transitioned = match &state.classification {
                Some(previous) => {
                    previous.health_state != classification.health_state
                        || previous.coach_message != classification.coach_message
                }
                None => true,
            };
            state.metrics = Some(sample);
            state.classification = Some(classification.clone());
        });

        if transitioned {
            self.emit(MonitorEvent::Classified {
                classification: classification.clone(),
            });
        }

        classification
    }

    /// Replace the alert list, announcing alerts that were not seen before
    ///
    /// Returns the newly seen alerts.
    pub fn set_alerts(&self, alerts: Vec<Alert>) -> Vec<Alert> {
        let mut fresh = Vec::new();
        self.state.send_modify(|state| {
            fresh = state.alerts.set_all(alerts);
        });

        for alert in &fresh {
            self.emit(MonitorEvent::AlertRaised {
                alert: alert.clone(),
            });
        }
        fresh
    }

    /// Prepend a single alert
    pub fn add_alert(&self, alert: Alert) {
        self.state.send_modify(|state| state.alerts.add(alert.clone()));
        self.emit(MonitorEvent::AlertRaised { alert });
    }

    /// Acknowledge an alert; false if the id is unknown
    pub fn acknowledge_alert(&self, id: &str) -> bool {
        let mut found = false;
        self.state.send_if_modified(|state| {
            found = state.alerts.acknowledge(id);
            found
        });
        found
    }

    pub fn set_session(&self, session: Option<SessionId>) {
        self.state.send_modify(|state| state.session = session.clone());
        self.emit(MonitorEvent::SessionChanged { session });
    }

    pub fn set_simulation(&self, simulation: Option<ActiveSimulation>) {
        self.state.send_modify(|state| state.simulation = simulation);
    }

    /// Back to the initial state (navigation away from the monitoring flow)
    ///
    /// Subscribers stay connected and observe the empty state.
    pub fn reset(&self) {
        self.state.send_replace(MonitoringState::default());
    }

    pub fn snapshot(&self) -> MonitoringState {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<SessionId> {
        self.state.borrow().session.clone()
    }

    pub fn is_simulating(&self) -> bool {
        self.state.borrow().is_simulating()
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitoringState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Send an event; having no subscribers is fine
    pub fn emit(&self, event: MonitorEvent) {
        let _ = self.events.send(event);
    }
}
