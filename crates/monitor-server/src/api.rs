//! HTTP API for the dashboard, health checks and Prometheus metrics

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use monitor_lib::{
    anomaly::MAX_SIMULATION_SECS,
    classify,
    health::{ComponentStatus, HealthRegistry},
    monitor::PollOutcome,
    MetricSample, Monitor, Scenario, SessionId,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub monitor: Monitor,
}

impl AppState {
    pub fn new(monitor: Monitor) -> Self {
        Self { monitor }
    }

    pub fn health_registry(&self) -> &HealthRegistry {
        self.monitor.health()
    }
}

/// JSON error body `{error, code}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: Option<&'static str>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: Some(code),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry().health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry().readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Current monitoring state
async fn monitoring(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.monitor.snapshot())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSimulationBody {
    pub scenario: String,
    #[serde(default)]
    pub duration: Option<u64>,
}

async fn start_simulation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartSimulationBody>,
) -> Result<impl IntoResponse, ApiError> {
    let scenario: Scenario = body
        .scenario
        .parse()
        .map_err(|e: monitor_lib::anomaly::UnknownScenario| {
            ApiError::new(StatusCode::BAD_REQUEST, "unknown_scenario", e.to_string())
        })?;

    if let Some(duration) = body.duration.filter(|d| *d > MAX_SIMULATION_SECS) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_duration",
            format!("duration {duration}s exceeds the {MAX_SIMULATION_SECS}s limit"),
        ));
    }

    if state.monitor.store().session().is_none() {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "no_session",
            "no monitoring session attached",
        ));
    }

    state.monitor.simulate(scenario, body.duration).await;
    Ok((StatusCode::ACCEPTED, Json(state.monitor.snapshot())))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopResponse {
    pub stopped: bool,
}

async fn stop_simulation(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stopped = state.monitor.stop_simulation().await;
    Json(StopResponse { stopped })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub outcome: Option<PollOutcome>,
}

async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let outcome = state.monitor.refresh().await;
    Json(RefreshResponse { outcome })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub acknowledged: bool,
}

/// Unknown ids are reported, not rejected
async fn acknowledge_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let acknowledged = state.monitor.acknowledge_alert(&id);
    Json(AckResponse { acknowledged })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
    pub session_id: String,
}

async fn attach_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SessionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let id = body.session_id.trim();
    if id.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_session",
            "sessionId must not be empty",
        ));
    }

    info!(session = %id, "Attaching session");
    state.monitor.attach_session(SessionId::new(id)).await;
    Ok(Json(state.monitor.snapshot()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetachResponse {
    pub detached: bool,
}

async fn detach_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let detached = state.monitor.detach_session().await;
    Json(DetachResponse { detached })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyQuery {
    pub cpu_usage: f64,
    pub latency: f64,
    pub error_rate: f64,
}

/// Classify an arbitrary reading without touching the published state
async fn classify_sample(Query(query): Query<ClassifyQuery>) -> Result<impl IntoResponse, ApiError> {
    let values = [query.cpu_usage, query.latency, query.error_rate];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_sample",
            "metric values must be finite numbers",
        ));
    }

    let sample = MetricSample::now(query.cpu_usage, query.latency, query.error_rate);
    Ok(Json(classify(&sample)))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/monitoring", get(monitoring))
        .route("/api/v1/monitoring/refresh", post(refresh))
        .route("/api/v1/monitoring/simulate/start", post(start_simulation))
        .route("/api/v1/monitoring/simulate/stop", post(stop_simulation))
        .route("/api/v1/alerts/:id/ack", post(acknowledge_alert))
        .route(
            "/api/v1/session",
            axum::routing::put(attach_session).delete(detach_session),
        )
        .route("/api/v1/classify", get(classify_sample))
        .with_state(state)
}

/// Start the API server
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
