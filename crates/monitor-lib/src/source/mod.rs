//! Sample sources feeding the monitoring core
//!
//! A sample source supplies metric readings and alerts for a session and
//! accepts simulation start/stop notifications. Two implementations exist:
//! an HTTP client for a real dashboard backend and an in-process fake used
//! for demos and tests.

mod http;
mod memory;

pub use http::{HttpSampleSource, DEFAULT_REQUEST_TIMEOUT};
pub use memory::InMemorySampleSource;

use crate::anomaly::Scenario;
use crate::models::{MonitoringSnapshot, SessionId};

pub use async_trait::async_trait;

/// Errors returned by a sample source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unknown session '{0}'")]
    UnknownSession(SessionId),

    #[error("sample source unavailable: {0}")]
    Unavailable(String),
}

/// Provider of metric samples and alerts
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Latest metrics and pending alerts for a session
    async fn fetch_monitoring(&self, session: &SessionId)
        -> Result<MonitoringSnapshot, SourceError>;

    /// Tell the provider a scenario is being simulated
    async fn start_simulation(
        &self,
        session: &SessionId,
        scenario: Scenario,
        duration_secs: Option<u64>,
    ) -> Result<(), SourceError>;

    /// Tell the provider the simulation is over
    async fn stop_simulation(&self, session: &SessionId) -> Result<(), SourceError>;
}
