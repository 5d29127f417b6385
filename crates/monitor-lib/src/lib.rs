//! Monitoring core for the deploy dashboard
//!
//! This crate provides the core functionality for:
//! - Threshold-based health classification and coach messages
//! - Periodic polling of a sample source
//! - Scenario simulation with automatic recovery
//! - Alert tracking with acknowledgement
//! - Health checks and observability

pub mod anomaly;
pub mod deploy;
pub mod health;
pub mod models;
pub mod monitor;
pub mod observability;
pub mod source;
pub mod state;

pub use anomaly::{classify, HealthClassification, HealthState, Mood, Scenario};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use monitor::{Monitor, MonitorConfig};
pub use observability::{MonitorMetrics, StructuredLogger};
pub use source::{HttpSampleSource, InMemorySampleSource, SampleSource, SourceError};
pub use state::{AlertStore, MonitorEvent, MonitoringStore, StopReason};
