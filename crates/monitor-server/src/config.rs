//! Server configuration

use std::time::Duration;

use anyhow::Result;
use monitor_lib::MonitorConfig;
use serde::Deserialize;

/// Server configuration, read from `MONITOR_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name attached to every log line
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// HTTP port for the dashboard API, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Dashboard backend base URL; the in-process source is used when unset
    #[serde(default)]
    pub source_url: Option<String>,

    /// Session to monitor right away
    #[serde(default)]
    pub session_id: Option<String>,

    /// Session whose deployment is watched; monitoring starts once it completes
    #[serde(default)]
    pub deploy_session_id: Option<String>,

    /// Poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Deploy status poll interval in seconds
    #[serde(default = "default_deploy_poll_interval")]
    pub deploy_poll_interval_secs: u64,

    /// Simulation length in seconds when a request gives none
    #[serde(default = "default_simulation_secs")]
    pub simulation_default_secs: u64,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "dashboard".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_poll_interval() -> u64 {
    5
}

fn default_deploy_poll_interval() -> u64 {
    3
}

fn default_simulation_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            source_url: None,
            session_id: None,
            deploy_session_id: None,
            poll_interval_secs: default_poll_interval(),
            deploy_poll_interval_secs: default_deploy_poll_interval(),
            simulation_default_secs: default_simulation_secs(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("MONITOR"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid configuration, using defaults");
            ServerConfig::default()
        }))
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            // A zero interval would make tokio's interval panic
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            default_simulation_secs: self.simulation_default_secs,
            instance_name: self.instance_name.clone(),
        }
    }

    pub fn deploy_poll_interval(&self) -> Duration {
        Duration::from_secs(self.deploy_poll_interval_secs.max(1))
    }
}
