//! Simulation scenario presets
//!
//! Fixed synthetic metric tuples used to demonstrate a specific danger
//! condition deterministically, plus the recovery reading published when a
//! simulation ends.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{Alert, AlertLevel, MetricSample};

/// Recovery preset (classifies as healthy)
pub const RECOVERY_CPU: f64 = 25.0;
pub const RECOVERY_LATENCY_MS: f64 = 150.0;
pub const RECOVERY_ERROR_RATE: f64 = 0.5;

/// Default simulation length when the caller does not pick one
pub const DEFAULT_SIMULATION_SECS: u64 = 30;

/// Longest simulation the HTTP surface accepts (one day)
pub const MAX_SIMULATION_SECS: u64 = 86_400;

/// Abnormal scenario that can be injected for demos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    CpuSpike,
    HighLatency,
    ErrorBurst,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::CpuSpike,
        Scenario::HighLatency,
        Scenario::ErrorBurst,
    ];

    /// (cpu %, latency ms, error rate %) for this scenario
    pub fn preset(&self) -> (f64, f64, f64) {
        match self {
            Scenario::CpuSpike => (85.0, 250.0, 1.0),
            Scenario::HighLatency => (45.0, 850.0, 2.0),
            Scenario::ErrorBurst => (50.0, 300.0, 8.0),
        }
    }

    /// Synthetic sample stamped now
    pub fn preset_sample(&self) -> MetricSample {
        let (cpu, latency, error_rate) = self.preset();
        MetricSample::now(cpu, latency, error_rate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::CpuSpike => "cpu_spike",
            Scenario::HighLatency => "high_latency",
            Scenario::ErrorBurst => "error_burst",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::CpuSpike => "CPU usage jumps to 85%",
            Scenario::HighLatency => "Response time climbs to 850ms",
            Scenario::ErrorBurst => "Error rate spikes to 8%",
        }
    }

    /// Critical alert announced when this scenario starts
    pub fn alert(&self) -> Alert {
        let message = match self {
            Scenario::CpuSpike => "CPU usage exceeded 85%",
            Scenario::HighLatency => "Response latency exceeded 850ms",
            Scenario::ErrorBurst => "Error rate exceeded 8%",
        };
        Alert::new(AlertLevel::Critical, message)
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cpu_spike" => Ok(Scenario::CpuSpike),
            "high_latency" => Ok(Scenario::HighLatency),
            "error_burst" => Ok(Scenario::ErrorBurst),
            _ => Err(UnknownScenario(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scenario '{0}' (expected cpu_spike, high_latency or error_burst)")]
pub struct UnknownScenario(pub String);

/// Reading published when a simulation ends
pub fn recovery_sample() -> MetricSample {
    MetricSample::now(RECOVERY_CPU, RECOVERY_LATENCY_MS, RECOVERY_ERROR_RATE)
}
