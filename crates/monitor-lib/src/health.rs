//! Component health for the liveness and readiness endpoints
//!
//! Three components report here: the poller, the sample source and the
//! simulation notifier. The sample source escalates from degraded to
//! unhealthy after [`SOURCE_UNHEALTHY_AFTER`] failed fetches in a row.
//! Readiness needs the monitor to be initialized and no unhealthy component,
//! except that a failing sample source is ignored while a simulation owns the
//! published state.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Consecutive failed fetches before the sample source counts as unhealthy
pub const SOURCE_UNHEALTHY_AFTER: u32 = 3;

/// Component status, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            updated_at: Utc::now(),
        }
    }
}

/// Body of `/healthz`: the worst component status plus every component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<String, ComponentHealth>,
}

/// Body of `/readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub mod components {
    pub const POLLER: &str = "poller";
    pub const SAMPLE_SOURCE: &str = "sample_source";
    pub const SIMULATION: &str = "simulation";

    pub const ALL: [&str; 3] = [POLLER, SAMPLE_SOURCE, SIMULATION];
}

#[derive(Debug, Default)]
struct Registry {
    components: BTreeMap<String, ComponentHealth>,
    initialized: bool,
    source_failures: u32,
    simulating: bool,
}

impl Registry {
    fn set(&mut self, name: &str, status: ComponentStatus, message: Option<String>) {
        self.components
            .insert(name.to_string(), ComponentHealth::new(status, message));
    }
}

/// Shared health state; clones report into the same registry
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every monitor component as healthy
    pub async fn register_all(&self) {
        let mut registry = self.inner.write().await;
        for name in components::ALL {
            registry.set(name, ComponentStatus::Healthy, None);
        }
    }

    pub async fn set_healthy(&self, name: &str) {
        self.inner
            .write()
            .await
            .set(name, ComponentStatus::Healthy, None);
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.inner
            .write()
            .await
            .set(name, ComponentStatus::Degraded, Some(message.into()));
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.inner
            .write()
            .await
            .set(name, ComponentStatus::Unhealthy, Some(message.into()));
    }

    /// A fetch succeeded: the sample source is healthy again
    pub async fn record_fetch_success(&self) {
        let mut registry = self.inner.write().await;
        registry.source_failures = 0;
        registry.set(components::SAMPLE_SOURCE, ComponentStatus::Healthy, None);
    }

    /// A fetch failed: degraded at first, unhealthy once failures pile up
    pub async fn record_fetch_failure(&self, error: &str) {
        let mut registry = self.inner.write().await;
        registry.source_failures += 1;
        let failures = registry.source_failures;
        let status = if failures >= SOURCE_UNHEALTHY_AFTER {
            ComponentStatus::Unhealthy
        } else {
            ComponentStatus::Degraded
        };
        registry.set(
            components::SAMPLE_SOURCE,
            status,
            Some(format!("{failures} consecutive failed fetches: {error}")),
        );
    }

    pub async fn set_simulating(&self, simulating: bool) {
        self.inner.write().await.simulating = simulating;
    }

    pub async fn set_ready(&self, ready: bool) {
        self.inner.write().await.initialized = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let registry = self.inner.read().await;
        let status = registry
            .components
            .values()
            .map(|c| c.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy);
        HealthResponse {
            status,
            components: registry.components.clone(),
        }
    }

    pub async fn component(&self, name: &str) -> Option<ComponentHealth> {
        self.inner.read().await.components.get(name).cloned()
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let registry = self.inner.read().await;
        if !registry.initialized {
            return ReadinessResponse {
                ready: false,
                reason: Some("Monitor not yet initialized".to_string()),
            };
        }

        let failing: Vec<&str> = registry
            .components
            .iter()
            .filter(|(_, c)| c.status == ComponentStatus::Unhealthy)
            .map(|(name, _)| name.as_str())
            .filter(|name| !(registry.simulating && *name == components::SAMPLE_SOURCE))
            .collect();

        if failing.is_empty() {
            ReadinessResponse {
                ready: true,
                reason: None,
            }
        } else {
            ReadinessResponse {
                ready: false,
                reason: Some(format!("Unhealthy components: {}", failing.join(", "))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ready_registry() -> HealthRegistry {
        let registry = HealthRegistry::new();
        registry.register_all().await;
        registry.set_ready(true).await;
        registry
    }

    #[tokio::test]
    async fn test_empty_registry_is_healthy_but_not_ready() {
        let registry = HealthRegistry::new();

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(
            readiness.reason.as_deref(),
            Some("Monitor not yet initialized")
        );
    }

    #[tokio::test]
    async fn test_overall_status_is_the_worst_component() {
        let registry = ready_registry().await;
        assert_eq!(registry.health().await.components.len(), 3);

        registry
            .set_degraded(components::SIMULATION, "stop notification failed")
            .await;
        assert_eq!(registry.health().await.status, ComponentStatus::Degraded);

        registry
            .set_unhealthy(components::POLLER, "poll task panicked")
            .await;
        assert_eq!(registry.health().await.status, ComponentStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_source_escalates_after_consecutive_failures() {
        let registry = ready_registry().await;

        for _ in 1..SOURCE_UNHEALTHY_AFTER {
            registry.record_fetch_failure("connection refused").await;
        }
        let source = registry.component(components::SAMPLE_SOURCE).await.unwrap();
        assert_eq!(source.status, ComponentStatus::Degraded);
        assert!(registry.readiness().await.ready);

        registry.record_fetch_failure("connection refused").await;
        let source = registry.component(components::SAMPLE_SOURCE).await.unwrap();
        assert_eq!(source.status, ComponentStatus::Unhealthy);
        assert_eq!(
            source.message.as_deref(),
            Some("3 consecutive failed fetches: connection refused")
        );

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(
            readiness.reason.as_deref(),
            Some("Unhealthy components: sample_source")
        );

        registry.record_fetch_success().await;
        assert!(registry.readiness().await.ready);
        registry.record_fetch_failure("timeout").await;
        let source = registry.component(components::SAMPLE_SOURCE).await.unwrap();
        assert_eq!(source.status, ComponentStatus::Degraded);
    }

    #[tokio::test]
    async fn test_failing_source_ignored_while_simulating() {
        let registry = ready_registry().await;
        for _ in 0..SOURCE_UNHEALTHY_AFTER {
            registry.record_fetch_failure("connection refused").await;
        }

        registry.set_simulating(true).await;
        assert!(registry.readiness().await.ready);

        registry.set_simulating(false).await;
        assert!(!registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_unhealthy_poller_blocks_readiness_even_while_simulating() {
        let registry = ready_registry().await;
        registry.set_simulating(true).await;
        registry.set_unhealthy(components::POLLER, "Failed").await;

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Unhealthy components: poller"));
    }
}
