//! Core data models for the monitoring core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anomaly::{HealthClassification, Scenario};
use crate::state::AlertStore;

/// A single metric reading from the sample source
///
/// Immutable snapshot; a new one is produced on every poll or simulation
/// tick and it has no identity beyond its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    /// CPU usage in percent (0-100)
    pub cpu_usage: f64,
    /// Response latency in milliseconds
    pub latency: f64,
    /// Error rate in percent (0-100)
    pub error_rate: f64,
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(cpu_usage: f64, latency: f64, error_rate: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            cpu_usage,
            latency,
            error_rate,
            timestamp,
        }
    }

    /// Sample stamped with the current instant
    pub fn now(cpu_usage: f64, latency: f64, error_rate: f64) -> Self {
        Self::new(cpu_usage, latency, error_rate, Utc::now())
    }
}

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertLevel::Info => write!(f, "info"),
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Alert event shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub level: AlertLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Flips to true only through an explicit acknowledgement
    #[serde(default)]
    pub acknowledged: bool,
}

impl Alert {
    /// Create an unacknowledged alert with a freshly generated id
    pub fn new(level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            id: format!("alert-{}", uuid::Uuid::new_v4()),
            level,
            message: message.into(),
            timestamp: Utc::now(),
            acknowledged: false,
        }
    }
}

/// Response of a monitoring fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSnapshot {
    pub metrics: MetricSample,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

/// Opaque identifier correlating monitoring calls with one deployment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Simulation currently overriding live metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSimulation {
    pub scenario: Scenario,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
}

/// The single published monitoring state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringState {
    pub session: Option<SessionId>,
    pub metrics: Option<MetricSample>,
    pub classification: Option<HealthClassification>,
    pub alerts: AlertStore,
    pub simulation: Option<ActiveSimulation>,
}

impl MonitoringState {
    pub fn is_simulating(&self) -> bool {
        self.simulation.is_some()
    }
}

/// Request body for starting a simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub scenario: Scenario,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_sample_wire_format() {
        let json = r#"{"cpuUsage":42.5,"latency":120,"errorRate":0.4,"timestamp":"2024-01-01T00:00:00Z"}"#;
        let sample: MetricSample = serde_json::from_str(json).unwrap();

        assert_eq!(sample.cpu_usage, 42.5);
        assert_eq!(sample.latency, 120.0);
        assert_eq!(sample.error_rate, 0.4);

        let value = serde_json::to_value(&sample).unwrap();
        assert!(value.get("cpuUsage").is_some());
        assert!(value.get("errorRate").is_some());
    }

    #[test]
    fn test_alert_defaults_to_unacknowledged() {
        let json = r#"{"id":"a1","level":"critical","message":"boom","timestamp":"2024-01-01T00:00:00Z"}"#;
        let alert: Alert = serde_json::from_str(json).unwrap();

        assert_eq!(alert.level, AlertLevel::Critical);
        assert!(!alert.acknowledged);
    }

    #[test]
    fn test_generated_alert_ids_are_unique() {
        let a = Alert::new(AlertLevel::Info, "one");
        let b = Alert::new(AlertLevel::Info, "two");
        assert_ne!(a.id, b.id);
        assert!(!a.acknowledged);
    }

    #[test]
    fn test_session_id_is_transparent() {
        let session = SessionId::new("sess-1");
        assert_eq!(serde_json::to_string(&session).unwrap(), "\"sess-1\"");
        assert_eq!(session.to_string(), "sess-1");
    }
}
