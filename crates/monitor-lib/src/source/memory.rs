//! In-process sample source
//!
//! Stands in for the dashboard backend: every session drifts randomly around
//! a healthy baseline, simulated scenarios pin the metrics to their preset
//! until stopped or expired, and deployments advance one stage per status
//! poll. Call counters and failure injection make it usable as a test double.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{async_trait, SampleSource, SourceError};
use crate::anomaly::{Scenario, DEFAULT_SIMULATION_SECS};
use crate::deploy::{DeploySource, DeployState, DeployStatus};
use crate::models::{Alert, AlertLevel, MetricSample, MonitoringSnapshot, SessionId};

/// Healthy baseline the drift centres on: (cpu %, latency ms, error rate %)
const BASELINE: (f64, f64, f64) = (30.0, 180.0, 0.8);

/// Maximum drift per reading from the baseline
const DRIFT: (f64, f64, f64) = (8.0, 60.0, 0.5);

/// Deploy stages in order: (state, progress, stage description)
const DEPLOY_STAGES: [(DeployState, u8, &str); 4] = [
    (DeployState::Init, 0, "Initializing workspace"),
    (DeployState::Planning, 25, "terraform plan"),
    (DeployState::Applying, 60, "terraform apply"),
    (DeployState::Complete, 100, "Deployment complete"),
];

#[derive(Debug)]
struct SessionState {
    scenario: Option<(Scenario, DateTime<Utc>)>,
    alerts: Vec<Alert>,
    deploy_stage: usize,
    deploy_failed: bool,
    deploy_logs: Vec<String>,
    created_at: DateTime<Utc>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            scenario: None,
            alerts: Vec::new(),
            deploy_stage: 0,
            deploy_failed: false,
            deploy_logs: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Scenario still in force at `now`, clearing it once expired
    fn active_scenario(&mut self, now: DateTime<Utc>) -> Option<Scenario> {
        match self.scenario {
            Some((scenario, deadline)) if now < deadline => Some(scenario),
            Some(_) => {
                self.scenario = None;
                None
            }
            None => None,
        }
    }
}

/// Fake dashboard backend keyed by session
pub struct InMemorySampleSource {
    sessions: DashMap<SessionId, SessionState>,
    rng: Mutex<StdRng>,
    fetch_count: AtomicUsize,
    start_count: AtomicUsize,
    stop_count: AtomicUsize,
    failures_remaining: AtomicUsize,
    reject_notifications: std::sync::atomic::AtomicBool,
}

impl Default for InMemorySampleSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySampleSource {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic drift for tests
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            sessions: DashMap::new(),
            rng: Mutex::new(rng),
            fetch_count: AtomicUsize::new(0),
            start_count: AtomicUsize::new(0),
            stop_count: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(0),
            reject_notifications: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Make the next `n` monitoring fetches fail
    pub fn fail_next_fetches(&self, n: usize) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Make simulation start/stop notifications fail
    pub fn reject_notifications(&self, reject: bool) {
        self.reject_notifications.store(reject, Ordering::SeqCst);
    }

    /// Make the deployment of a session end in FAILED
    pub fn fail_deploy(&self, session: &SessionId) {
        self.sessions
            .entry(session.clone())
            .or_insert_with(SessionState::new)
            .deploy_failed = true;
    }

    /// Push an alert into a session, newest first
    pub fn push_alert(&self, session: &SessionId, alert: Alert) {
        self.sessions
            .entry(session.clone())
            .or_insert_with(SessionState::new)
            .alerts
            .insert(0, alert);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.start_count.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }

    /// Scenario the fake backend believes is active for a session
    pub fn active_scenario(&self, session: &SessionId) -> Option<Scenario> {
        self.sessions
            .get_mut(session)
            .and_then(|mut state| state.active_scenario(Utc::now()))
    }

    fn drifted_sample(&self) -> MetricSample {
        let mut rng = self.rng.lock();
        let cpu = BASELINE.0 + rng.gen_range(-DRIFT.0..=DRIFT.0);
        let latency = BASELINE.1 + rng.gen_range(-DRIFT.1..=DRIFT.1);
        let error_rate = BASELINE.2 + rng.gen_range(-DRIFT.2..=DRIFT.2);

        MetricSample::now(
            round1(cpu.clamp(0.0, 100.0)),
            round1(latency.max(0.0)),
            round1(error_rate.clamp(0.0, 100.0)),
        )
    }

    fn check_notifications(&self) -> Result<(), SourceError> {
        if self.reject_notifications.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable(
                "simulation endpoint rejected the request".to_string(),
            ));
        }
        Ok(())
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Scenario expiry, saturating at the latest representable time
fn scenario_deadline(now: DateTime<Utc>, duration_secs: u64) -> DateTime<Utc> {
    i64::try_from(duration_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|duration| now.checked_add_signed(duration))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[async_trait]
impl SampleSource for InMemorySampleSource {
    async fn fetch_monitoring(
        &self,
        session: &SessionId,
    ) -> Result<MonitoringSnapshot, SourceError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let injected_failure = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected_failure {
            return Err(SourceError::Unavailable("injected failure".to_string()));
        }

        let mut state = self
            .sessions
            .entry(session.clone())
            .or_insert_with(SessionState::new);

        let metrics = match state.active_scenario(Utc::now()) {
            Some(scenario) => scenario.preset_sample(),
            None => self.drifted_sample(),
        };

        Ok(MonitoringSnapshot {
            metrics,
            alerts: state.alerts.clone(),
        })
    }

    async fn start_simulation(
        &self,
        session: &SessionId,
        scenario: Scenario,
        duration_secs: Option<u64>,
    ) -> Result<(), SourceError> {
        self.start_count.fetch_add(1, Ordering::SeqCst);
        self.check_notifications()?;

        let duration = duration_secs.unwrap_or(DEFAULT_SIMULATION_SECS);
        let deadline = scenario_deadline(Utc::now(), duration);

        let mut state = self
            .sessions
            .entry(session.clone())
            .or_insert_with(SessionState::new);
        state.scenario = Some((scenario, deadline));
        state.alerts.insert(0, scenario.alert());

        debug!(session = %session, scenario = %scenario, duration_secs = duration, "Fake backend scenario started");
        Ok(())
    }

    async fn stop_simulation(&self, session: &SessionId) -> Result<(), SourceError> {
        self.stop_count.fetch_add(1, Ordering::SeqCst);
        self.check_notifications()?;

        let mut state = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| SourceError::UnknownSession(session.clone()))?;

        if state.scenario.take().is_some() {
            state.alerts.insert(
                0,
                Alert::new(AlertLevel::Info, "Simulation ended, metrics recovered"),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl DeploySource for InMemorySampleSource {
    async fn fetch_deploy_status(&self, session: &SessionId) -> Result<DeployStatus, SourceError> {
        let mut state = self
            .sessions
            .entry(session.clone())
            .or_insert_with(SessionState::new);

        let (mut deploy_state, mut progress, mut stage) = DEPLOY_STAGES[state.deploy_stage];
        if state.deploy_failed && state.deploy_stage >= 2 {
            deploy_state = DeployState::Failed;
            progress = 60;
            stage = "terraform apply failed";
        }

        let line = format!("[{}] {}", deploy_state, stage);
        if state.deploy_logs.last() != Some(&line) {
            state.deploy_logs.push(line);
        }
        if state.deploy_stage + 1 < DEPLOY_STAGES.len() {
            state.deploy_stage += 1;
        }

        Ok(DeployStatus {
            session_id: session.clone(),
            state: deploy_state,
            progress,
            current_stage: stage.to_string(),
            logs: state.deploy_logs.clone(),
            created_at: state.created_at,
            updated_at: Utc::now(),
        })
    }
}
