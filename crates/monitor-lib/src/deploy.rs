//! Deploy-side collaborator
//!
//! The monitoring core only cares about the deployment through its session:
//! monitoring is active once a deployment has completed and its session is
//! attached. `DeployWatcher` polls deploy status until it reaches a terminal
//! state and attaches the session on success.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::models::SessionId;
use crate::monitor::Monitor;
use crate::source::{async_trait, SourceError};

/// Deploy status polling interval
pub const DEFAULT_DEPLOY_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Lifecycle state of a mocked deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeployState {
    Init,
    Planning,
    Applying,
    Complete,
    Failed,
    Destroying,
}

impl DeployState {
    /// Polling stops once one of these is reached
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeployState::Complete | DeployState::Failed)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            DeployState::Init
                | DeployState::Planning
                | DeployState::Applying
                | DeployState::Destroying
        )
    }
}

impl std::fmt::Display for DeployState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeployState::Init => "INIT",
            DeployState::Planning => "PLANNING",
            DeployState::Applying => "APPLYING",
            DeployState::Complete => "COMPLETE",
            DeployState::Failed => "FAILED",
            DeployState::Destroying => "DESTROYING",
        };
        f.write_str(s)
    }
}

/// Deploy status as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployStatus {
    pub session_id: SessionId,
    pub state: DeployState,
    /// Progress in percent (0-100)
    pub progress: u8,
    pub current_stage: String,
    #[serde(default)]
    pub logs: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Provider of deploy status
#[async_trait]
pub trait DeploySource: Send + Sync {
    async fn fetch_deploy_status(&self, session: &SessionId) -> Result<DeployStatus, SourceError>;
}

/// Polls a deployment until it finishes and gates monitoring on the result
pub struct DeployWatcher {
    source: Arc<dyn DeploySource>,
    interval: Duration,
}

impl DeployWatcher {
    pub fn new(source: Arc<dyn DeploySource>) -> Self {
        Self {
            source,
            interval: DEFAULT_DEPLOY_POLL_INTERVAL,
        }
    }

    /// Set custom polling interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Poll until the deployment is terminal or shutdown is signalled
    ///
    /// On COMPLETE the session is attached to the monitor, which starts
    /// polling metrics. FAILED leaves monitoring inactive. Returns the last
    /// status seen, or `None` when shut down before a terminal state.
    pub async fn watch(
        &self,
        session: SessionId,
        monitor: &Monitor,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Option<DeployStatus> {
        info!(
            session = %session,
            interval_secs = self.interval.as_secs(),
            "Watching deployment"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let status = match self.source.fetch_deploy_status(&session).await {
                        Ok(status) => status,
                        Err(e) => {
                            warn!(session = %session, error = %e, "Failed to fetch deploy status");
                            continue;
                        }
                    };

                    debug!(
                        session = %session,
                        state = %status.state,
                        progress = status.progress,
                        stage = %status.current_stage,
                        "Deploy status"
                    );

                    match status.state {
                        DeployState::Complete => {
                            info!(session = %session, "Deployment complete, starting monitoring");
                            monitor.attach_session(session.clone()).await;
                            return Some(status);
                        }
                        DeployState::Failed => {
                            warn!(
                                session = %session,
                                stage = %status.current_stage,
                                "Deployment failed, monitoring stays inactive"
                            );
                            return Some(status);
                        }
                        _ => {}
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down deploy watcher");
                    return None;
                }
            }
        }
    }
}
