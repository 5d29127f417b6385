//! Health classification of metric samples
//!
//! Evaluates the three metric channels (CPU, latency, error rate) against
//! fixed warning and danger thresholds, sums the weighted severities into a
//! health score and picks the coach message for the dominant cause.

use serde::{Deserialize, Serialize};

use crate::models::MetricSample;

/// Coach message when CPU usage is in the danger range
pub const MSG_CPU_DANGER: &str = "🚨 CPU is overheating!";
/// Coach message when latency is in the danger range
pub const MSG_LATENCY_DANGER: &str = "🚨 Response times are very slow!";
/// Coach message when the error rate is in the danger range
pub const MSG_ERROR_DANGER: &str = "🚨 Errors are piling up!";
/// Coach message for danger without a single dominant channel
pub const MSG_GENERIC_DANGER: &str = "🚨 The system is unstable!";
/// Coach message for the warning state
pub const MSG_WARNING: &str = "⚠️ Things are a little shaky";
/// Coach message for the healthy state
pub const MSG_HEALTHY: &str = "👍 Everything is running smoothly!";

/// Discrete system health level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Warning,
    Danger,
}

impl HealthState {
    /// Numeric level used for the Prometheus gauge
    pub fn level(&self) -> i64 {
        match self {
            HealthState::Healthy => 0,
            HealthState::Warning => 1,
            HealthState::Danger => 2,
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthState::Healthy => write!(f, "healthy"),
            HealthState::Warning => write!(f, "warning"),
            HealthState::Danger => write!(f, "danger"),
        }
    }
}

/// Animation mood of the dashboard coach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Worried,
    Crying,
}

impl From<HealthState> for Mood {
    fn from(state: HealthState) -> Self {
        match state {
            HealthState::Healthy => Mood::Happy,
            HealthState::Warning => Mood::Worried,
            HealthState::Danger => Mood::Crying,
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mood::Happy => write!(f, "happy"),
            Mood::Worried => write!(f, "worried"),
            Mood::Crying => write!(f, "crying"),
        }
    }
}

/// Result of classifying one metric sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthClassification {
    /// Cumulative weighted severity, higher is worse (not clamped)
    pub health_score: u32,
    pub health_state: HealthState,
    pub mood: Mood,
    pub coach_message: String,
}

/// Warning/danger thresholds and weights for one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelThresholds {
    pub warning: f64,
    pub danger: f64,
    pub warning_weight: u32,
    pub danger_weight: u32,
}

impl ChannelThresholds {
    /// Status of a single value against these thresholds (inclusive)
    pub fn status(&self, value: f64) -> HealthState {
        if value >= self.danger {
            HealthState::Danger
        } else if value >= self.warning {
            HealthState::Warning
        } else {
            HealthState::Healthy
        }
    }

    /// Weighted contribution of a value to the health score
    pub fn contribution(&self, value: f64) -> u32 {
        match self.status(value) {
            HealthState::Danger => self.danger_weight,
            HealthState::Warning => self.warning_weight,
            HealthState::Healthy => 0,
        }
    }
}

pub const CPU_THRESHOLDS: ChannelThresholds = ChannelThresholds {
    warning: 50.0,
    danger: 70.0,
    warning_weight: 30,
    danger_weight: 50,
};

pub const LATENCY_THRESHOLDS: ChannelThresholds = ChannelThresholds {
    warning: 400.0,
    danger: 700.0,
    warning_weight: 20,
    danger_weight: 40,
};

pub const ERROR_RATE_THRESHOLDS: ChannelThresholds = ChannelThresholds {
    warning: 3.0,
    danger: 5.0,
    warning_weight: 20,
    danger_weight: 30,
};

/// A metric channel evaluated by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricChannel {
    Cpu,
    Latency,
    ErrorRate,
}

impl MetricChannel {
    /// Channels in evaluation order; the first in danger names the coach message
    pub const ALL: [MetricChannel; 3] = [
        MetricChannel::Cpu,
        MetricChannel::Latency,
        MetricChannel::ErrorRate,
    ];

    pub fn thresholds(&self) -> ChannelThresholds {
        match self {
            MetricChannel::Cpu => CPU_THRESHOLDS,
            MetricChannel::Latency => LATENCY_THRESHOLDS,
            MetricChannel::ErrorRate => ERROR_RATE_THRESHOLDS,
        }
    }

    pub fn value(&self, sample: &MetricSample) -> f64 {
        match self {
            MetricChannel::Cpu => sample.cpu_usage,
            MetricChannel::Latency => sample.latency,
            MetricChannel::ErrorRate => sample.error_rate,
        }
    }

    /// Per-channel status, as shown on the individual metric cards
    pub fn status(&self, sample: &MetricSample) -> HealthState {
        self.thresholds().status(self.value(sample))
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricChannel::Cpu => "CPU",
            MetricChannel::Latency => "Latency",
            MetricChannel::ErrorRate => "Error rate",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricChannel::Cpu | MetricChannel::ErrorRate => "%",
            MetricChannel::Latency => "ms",
        }
    }

    fn danger_message(&self) -> &'static str {
        match self {
            MetricChannel::Cpu => MSG_CPU_DANGER,
            MetricChannel::Latency => MSG_LATENCY_DANGER,
            MetricChannel::ErrorRate => MSG_ERROR_DANGER,
        }
    }
}

/// Classify a metric sample into a health state and coach message
///
/// Pure and deterministic. Inputs are not validated; any finite value
/// (negative or out of range included) produces a classification.
pub fn classify(sample: &MetricSample) -> HealthClassification {
    let health_score = MetricChannel::ALL
        .iter()
        .map(|channel| channel.thresholds().contribution(channel.value(sample)))
        .sum();

    let health_state = MetricChannel::ALL
        .iter()
        .map(|channel| channel.status(sample))
        .max()
        .unwrap_or(HealthState::Healthy);

    let coach_message = match health_state {
        HealthState::Danger => MetricChannel::ALL
            .iter()
            .find(|channel| channel.status(sample) == HealthState::Danger)
            .map(|channel| channel.danger_message())
            .unwrap_or(MSG_GENERIC_DANGER),
        HealthState::Warning => MSG_WARNING,
        HealthState::Healthy => MSG_HEALTHY,
    };

    HealthClassification {
        health_score,
        health_state,
        mood: Mood::from(health_state),
        coach_message: coach_message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cpu: f64, latency: f64, error_rate: f64) -> MetricSample {
        MetricSample::now(cpu, latency, error_rate)
    }

    #[test]
    fn test_below_all_warning_thresholds_is_healthy() {
        for (cpu, latency, err) in [
            (0.0, 0.0, 0.0),
            (49.9, 399.9, 2.99),
            (25.0, 150.0, 0.5),
            (10.0, 380.0, 2.5),
        ] {
            let result = classify(&sample(cpu, latency, err));
            assert_eq!(result.health_state, HealthState::Healthy);
            assert_eq!(result.health_score, 0);
            assert_eq!(result.mood, Mood::Happy);
            assert_eq!(result.coach_message, MSG_HEALTHY);
        }
    }

    #[test]
    fn test_cpu_danger_boundary_is_inclusive() {
        for (latency, err) in [(0.0, 0.0), (500.0, 4.0), (800.0, 9.0)] {
            let result = classify(&sample(70.0, latency, err));
            assert_eq!(result.health_state, HealthState::Danger);
            assert_eq!(result.coach_message, MSG_CPU_DANGER);
        }
    }

    #[test]
    fn test_warning_boundaries_are_inclusive() {
        let result = classify(&sample(50.0, 0.0, 0.0));
        assert_eq!(result.health_state, HealthState::Warning);
        assert_eq!(result.health_score, 30);

        let result = classify(&sample(0.0, 400.0, 0.0));
        assert_eq!(result.health_state, HealthState::Warning);
        assert_eq!(result.health_score, 20);

        let result = classify(&sample(0.0, 0.0, 3.0));
        assert_eq!(result.health_state, HealthState::Warning);
        assert_eq!(result.health_score, 20);
        assert_eq!(result.mood, Mood::Worried);
        assert_eq!(result.coach_message, MSG_WARNING);
    }

    #[test]
    fn test_cpu_spike_preset() {
        let result = classify(&sample(85.0, 250.0, 1.0));
        assert_eq!(result.health_score, 50);
        assert_eq!(result.health_state, HealthState::Danger);
        assert_eq!(result.mood, Mood::Crying);
        assert_eq!(result.coach_message, MSG_CPU_DANGER);
    }

    #[test]
    fn test_high_latency_preset() {
        let result = classify(&sample(45.0, 850.0, 2.0));
        assert_eq!(result.health_score, 40);
        assert_eq!(result.health_state, HealthState::Danger);
        assert_eq!(result.coach_message, MSG_LATENCY_DANGER);
    }

    #[test]
    fn test_error_burst_preset() {
        // CPU sits exactly on its (inclusive) warning threshold, so it adds 30
        // on top of the error-rate danger weight.
        let result = classify(&sample(50.0, 300.0, 8.0));
        assert_eq!(result.health_score, 60);
        assert_eq!(result.health_state, HealthState::Danger);
        assert_eq!(result.coach_message, MSG_ERROR_DANGER);
    }

    #[test]
    fn test_score_is_raw_sum_without_clamping() {
        let result = classify(&sample(95.0, 900.0, 12.0));
        assert_eq!(result.health_score, 120);
        assert_eq!(result.coach_message, MSG_CPU_DANGER);
    }

    #[test]
    fn test_latency_takes_precedence_over_error_rate() {
        let result = classify(&sample(10.0, 750.0, 6.0));
        assert_eq!(result.health_score, 70);
        assert_eq!(result.coach_message, MSG_LATENCY_DANGER);
    }

    #[test]
    fn test_out_of_range_inputs_do_not_panic() {
        let result = classify(&sample(-10.0, -1.0, -0.5));
        assert_eq!(result.health_state, HealthState::Healthy);

        let result = classify(&sample(1e9, 1e12, 400.0));
        assert_eq!(result.health_state, HealthState::Danger);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let s = sample(62.0, 520.0, 4.2);
        assert_eq!(classify(&s), classify(&s));
    }

    #[test]
    fn test_channel_status() {
        let s = sample(55.0, 720.0, 1.0);
        assert_eq!(MetricChannel::Cpu.status(&s), HealthState::Warning);
        assert_eq!(MetricChannel::Latency.status(&s), HealthState::Danger);
        assert_eq!(MetricChannel::ErrorRate.status(&s), HealthState::Healthy);
    }

    #[test]
    fn test_mood_follows_state() {
        assert_eq!(Mood::from(HealthState::Healthy), Mood::Happy);
        assert_eq!(Mood::from(HealthState::Warning), Mood::Worried);
        assert_eq!(Mood::from(HealthState::Danger), Mood::Crying);
    }
}
