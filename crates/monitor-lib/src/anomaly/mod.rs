//! Anomaly classification for dashboard metrics
//!
//! This module provides:
//! - Threshold-based health classification of metric samples
//! - Coach message selection by dominant cause
//! - Scenario presets for simulation mode

mod classifier;
mod scenario;

pub use classifier::{
    classify, ChannelThresholds, HealthClassification, HealthState, MetricChannel, Mood,
    CPU_THRESHOLDS, ERROR_RATE_THRESHOLDS, LATENCY_THRESHOLDS, MSG_CPU_DANGER,
    MSG_ERROR_DANGER, MSG_GENERIC_DANGER, MSG_HEALTHY, MSG_LATENCY_DANGER, MSG_WARNING,
};
pub use scenario::{
    recovery_sample, Scenario, UnknownScenario, DEFAULT_SIMULATION_SECS, MAX_SIMULATION_SECS,
    RECOVERY_CPU, RECOVERY_ERROR_RATE, RECOVERY_LATENCY_MS,
};
