//! Observability infrastructure for the monitoring core
//!
//! Provides:
//! - Prometheus metrics (poll latency, poll errors, health score, simulations, alerts)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::anomaly::{HealthClassification, HealthState, Scenario};
use crate::models::{Alert, AlertLevel, SessionId};
use crate::state::StopReason;

/// Histogram buckets for sample source round trips (in seconds)
const FETCH_LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    fetch_latency_seconds: Histogram,
    polls: IntCounter,
    poll_errors: IntCounter,
    health_score: IntGauge,
    health_state: IntGauge,
    simulations: IntCounterVec,
    simulation_active: IntGauge,
    alerts: IntGauge,
    alerts_unacknowledged: IntGauge,
    notify_errors: IntCounter,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            fetch_latency_seconds: register_histogram!(
                "dashboard_monitor_fetch_latency_seconds",
                "Round trip time of monitoring fetches",
                FETCH_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register fetch_latency_seconds"),

            polls: register_int_counter!(
                "dashboard_monitor_polls_total",
                "Total number of successful monitoring polls"
            )
            .expect("Failed to register polls"),

            poll_errors: register_int_counter!(
                "dashboard_monitor_poll_errors_total",
                "Total number of failed monitoring polls"
            )
            .expect("Failed to register poll_errors"),

            health_score: register_int_gauge!(
                "dashboard_monitor_health_score",
                "Health score of the latest classified sample (higher is worse)"
            )
            .expect("Failed to register health_score"),

            health_state: register_int_gauge!(
                "dashboard_monitor_health_state",
                "Current health state (0 healthy, 1 warning, 2 danger)"
            )
            .expect("Failed to register health_state"),

            simulations: register_int_counter_vec!(
                "dashboard_monitor_simulations_total",
                "Total number of simulations started",
                &["scenario"]
            )
            .expect("Failed to register simulations"),

            simulation_active: register_int_gauge!(
                "dashboard_monitor_simulation_active",
                "1 while a simulation overrides live metrics"
            )
            .expect("Failed to register simulation_active"),

            alerts: register_int_gauge!(
                "dashboard_monitor_alerts",
                "Number of alerts currently held"
            )
            .expect("Failed to register alerts"),

            alerts_unacknowledged: register_int_gauge!(
                "dashboard_monitor_alerts_unacknowledged",
                "Number of alerts not yet acknowledged"
            )
            .expect("Failed to register alerts_unacknowledged"),

            notify_errors: register_int_counter!(
                "dashboard_monitor_notify_errors_total",
                "Simulation start/stop notifications the sample source rejected"
            )
            .expect("Failed to register notify_errors"),
        }
    }
}

/// Monitor metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_fetch_latency(&self, duration_secs: f64) {
        self.inner().fetch_latency_seconds.observe(duration_secs);
    }

    pub fn inc_polls(&self) {
        self.inner().polls.inc();
    }

    pub fn inc_poll_errors(&self) {
        self.inner().poll_errors.inc();
    }

    /// Record the latest classification
    pub fn set_health(&self, classification: &HealthClassification) {
        self.inner()
            .health_score
            .set(classification.health_score as i64);
        self.inner()
            .health_state
            .set(classification.health_state.level());
    }

    pub fn inc_simulations(&self, scenario: Scenario) {
        self.inner()
            .simulations
            .with_label_values(&[scenario.as_str()])
            .inc();
    }

    pub fn set_simulation_active(&self, active: bool) {
        self.inner().simulation_active.set(i64::from(active));
    }

    pub fn set_alerts(&self, total: usize, unacknowledged: usize) {
        self.inner().alerts.set(total as i64);
        self.inner().alerts_unacknowledged.set(unacknowledged as i64);
    }

    pub fn inc_notify_errors(&self) {
        self.inner().notify_errors.inc();
    }
}

/// Structured logger for monitoring events
///
/// Every line carries the instance name so logs from several dashboards can
/// be told apart.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Log monitor startup
    pub fn log_startup(&self, version: &str, source: &str, poll_interval_secs: u64) {
        info!(
            event = "monitor_started",
            instance = %self.instance,
            version = %version,
            source = %source,
            poll_interval_secs = poll_interval_secs,
            "Dashboard monitor started"
        );
    }

    /// Log monitor shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Dashboard monitor shutting down"
        );
    }

    /// Log a health classification; danger is logged as a warning
    pub fn log_classification(&self, session: &SessionId, classification: &HealthClassification) {
        match classification.health_state {
            HealthState::Danger => {
                warn!(
                    event = "health_classified",
                    instance = %self.instance,
                    session = %session,
                    health_state = %classification.health_state,
                    health_score = classification.health_score,
                    coach_message = %classification.coach_message,
                    "System in danger"
                );
            }
            _ => {
                debug!(
                    event = "health_classified",
                    instance = %self.instance,
                    session = %session,
                    health_state = %classification.health_state,
                    health_score = classification.health_score,
                    "Health classified"
                );
            }
        }
    }

    pub fn log_poll_failure(&self, session: &SessionId, error: &str) {
        warn!(
            event = "poll_failed",
            instance = %self.instance,
            session = %session,
            error = %error,
            "Monitoring poll failed, keeping last known state"
        );
    }

    pub fn log_simulation_started(&self, session: &SessionId, scenario: Scenario, duration_secs: u64) {
        info!(
            event = "simulation_started",
            instance = %self.instance,
            session = %session,
            scenario = %scenario,
            duration_secs = duration_secs,
            "Simulation started"
        );
    }

    pub fn log_simulation_stopped(&self, session: Option<&SessionId>, scenario: Scenario, reason: StopReason) {
        info!(
            event = "simulation_stopped",
            instance = %self.instance,
            session = ?session.map(SessionId::as_str),
            scenario = %scenario,
            reason = %reason,
            "Simulation stopped"
        );
    }

    /// Log a rejected simulation start/stop notification
    pub fn log_notify_failure(&self, session: &SessionId, action: &str, error: &str) {
        warn!(
            event = "simulation_notify_failed",
            instance = %self.instance,
            session = %session,
            action = %action,
            error = %error,
            "Sample source rejected simulation notification"
        );
    }

    pub fn log_alert_raised(&self, alert: &Alert) {
        match alert.level {
            AlertLevel::Critical => {
                warn!(
                    event = "alert_raised",
                    instance = %self.instance,
                    alert_id = %alert.id,
                    level = %alert.level,
                    message = %alert.message,
                    "Critical alert raised"
                );
            }
            _ => {
                info!(
                    event = "alert_raised",
                    instance = %self.instance,
                    alert_id = %alert.id,
                    level = %alert.level,
                    message = %alert.message,
                    "Alert raised"
                );
            }
        }
    }

    pub fn log_session_changed(&self, session: Option<&SessionId>) {
        info!(
            event = "session_changed",
            instance = %self.instance,
            session = ?session.map(SessionId::as_str),
            "Monitoring session changed"
        );
    }
}
