//! HTTP client for the dashboard backend

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use url::Url;

use super::{async_trait, SampleSource, SourceError};
use crate::anomaly::Scenario;
use crate::deploy::{DeploySource, DeployStatus};
use crate::models::{MonitoringSnapshot, SessionId, SimulationRequest};

/// Per-request timeout; a poll must finish well inside the poll interval
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Sample source backed by the dashboard REST API
pub struct HttpSampleSource {
    client: Client,
    base_url: Url,
}

impl HttpSampleSource {
    /// Create a new client for the given base URL
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;

        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }
        // endpoint() pops the empty segment this trailing '/' leaves
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL plus one encoded path segment per entry
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api { status, body });
        }

        Ok(response.json().await?)
    }

    async fn post<B: Serialize>(&self, url: Url, body: &B) -> Result<(), SourceError> {
        let response = self.client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl SampleSource for HttpSampleSource {
    async fn fetch_monitoring(
        &self,
        session: &SessionId,
    ) -> Result<MonitoringSnapshot, SourceError> {
        let url = self.endpoint(&["monitoring", session.as_str()])?;
        self.get(url).await
    }

    async fn start_simulation(
        &self,
        session: &SessionId,
        scenario: Scenario,
        duration_secs: Option<u64>,
    ) -> Result<(), SourceError> {
        let request = SimulationRequest {
            session_id: Some(session.clone()),
            scenario,
            duration: duration_secs,
        };
        let url = self.endpoint(&["monitoring", "simulate", "start"])?;
        self.post(url, &request).await
    }

    async fn stop_simulation(&self, session: &SessionId) -> Result<(), SourceError> {
        let url = self.endpoint(&["monitoring", "simulate", "stop"])?;
        self.post(url, &json!({ "sessionId": session })).await
    }
}

#[async_trait]
impl DeploySource for HttpSampleSource {
    async fn fetch_deploy_status(&self, session: &SessionId) -> Result<DeployStatus, SourceError> {
        let url = self.endpoint(&["deploy", "status", session.as_str()])?;
        self.get(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::DeployState;
    use crate::models::AlertLevel;

    const MONITORING_BODY: &str = r#"{
        "metrics": {"cpuUsage": 33.0, "latency": 210.0, "errorRate": 0.7, "timestamp": "2024-01-01T00:00:00Z"},
        "alerts": [
            {"id": "a1", "level": "warning", "message": "Latency rising", "timestamp": "2024-01-01T00:00:00Z", "acknowledged": false}
        ]
    }"#;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let source = HttpSampleSource::new("http://localhost:8080/api").unwrap();
        assert_eq!(source.base_url().as_str(), "http://localhost:8080/api/");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpSampleSource::new("not a url");
        assert!(matches!(result, Err(SourceError::InvalidUrl(_))));
    }

    #[test]
    fn test_cannot_be_a_base_url_rejected() {
        let result = HttpSampleSource::new("mailto:ops@example.com");
        assert!(matches!(result, Err(SourceError::InvalidUrl(_))));
    }

    #[test]
    fn test_session_id_stays_in_one_segment() {
        let source = HttpSampleSource::new("http://localhost:8080/api").unwrap();

        let url = source.endpoint(&["monitoring", "../admin"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/monitoring/..%2Fadmin");

        let url = source.endpoint(&["deploy", "status", "a b?c#d"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/deploy/status/a%20b%3Fc%23d"
        );
    }

    #[tokio::test]
    async fn test_fetch_monitoring_encodes_session() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/monitoring/..%2Fdeploy%2Fstatus")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(MONITORING_BODY)
            .create_async()
            .await;

        let source = HttpSampleSource::new(&server.url()).unwrap();
        let snapshot = source
            .fetch_monitoring(&SessionId::new("../deploy/status"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_monitoring() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/monitoring/sess-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(MONITORING_BODY)
            .create_async()
            .await;

        let source = HttpSampleSource::new(&server.url()).unwrap();
        let snapshot = source
            .fetch_monitoring(&SessionId::new("sess-1"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.metrics.cpu_usage, 33.0);
        assert_eq!(snapshot.alerts.len(), 1);
        assert_eq!(snapshot.alerts[0].level, AlertLevel::Warning);
    }

    #[tokio::test]
    async fn test_fetch_monitoring_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/monitoring/sess-1")
            .with_status(503)
            .with_body("backend down")
            .create_async()
            .await;

        let source = HttpSampleSource::new(&server.url()).unwrap();
        let err = source
            .fetch_monitoring(&SessionId::new("sess-1"))
            .await
            .unwrap_err();

        match err {
            SourceError::Api { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "backend down");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_simulation_posts_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/monitoring/simulate/start")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "sessionId": "sess-1",
                "scenario": "error_burst",
                "duration": 30
            })))
            .with_status(200)
            .create_async()
            .await;

        let source = HttpSampleSource::new(&server.url()).unwrap();
        source
            .start_simulation(&SessionId::new("sess-1"), Scenario::ErrorBurst, Some(30))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_stop_simulation_posts_session() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/monitoring/simulate/stop")
            .match_body(mockito::Matcher::Json(serde_json::json!({ "sessionId": "sess-1" })))
            .with_status(204)
            .create_async()
            .await;

        let source = HttpSampleSource::new(&server.url()).unwrap();
        source
            .stop_simulation(&SessionId::new("sess-1"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_deploy_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/deploy/status/sess-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"sessionId":"sess-1","state":"APPLYING","progress":60,"currentStage":"terraform apply",
                    "logs":["plan ok"],"createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:01:00Z"}"#,
            )
            .create_async()
            .await;

        let source = HttpSampleSource::new(&server.url()).unwrap();
        let status = source
            .fetch_deploy_status(&SessionId::new("sess-1"))
            .await
            .unwrap();

        assert_eq!(status.state, DeployState::Applying);
        assert_eq!(status.progress, 60);
    }
}
