//! Monitoring state, classification and health commands

use anyhow::Result;
use monitor_lib::{
    anomaly::MetricChannel, classify, ComponentStatus, HealthClassification, HealthResponse,
    MetricSample, MonitoringState, Scenario,
};
use tabled::Tabled;

use crate::client::{ApiClient, RefreshResponse};
use crate::output::{
    color_health_state, color_status, format_ms, format_percent, format_with_unit, mood_face,
    print_info, print_json, print_success, print_table, print_warning, OutputFormat,
};

/// Row for the metric channel table
#[derive(Tabled, serde::Serialize)]
struct ChannelRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Warning at")]
    warning: String,
    #[tabled(rename = "Danger at")]
    danger: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled, serde::Serialize)]
struct ScenarioRow {
    #[tabled(rename = "Scenario")]
    name: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Errors")]
    error_rate: String,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled, serde::Serialize)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn format_channel(channel: MetricChannel, value: f64) -> String {
    format_with_unit(value, channel.unit())
}

fn channel_rows(sample: &MetricSample) -> Vec<ChannelRow> {
    MetricChannel::ALL
        .into_iter()
        .map(|channel| {
            let thresholds = channel.thresholds();
            ChannelRow {
                metric: channel.label().to_string(),
                value: format_channel(channel, channel.value(sample)),
                warning: format_channel(channel, thresholds.warning),
                danger: format_channel(channel, thresholds.danger),
                status: color_health_state(channel.status(sample)),
            }
        })
        .collect()
}

fn print_classification(classification: &HealthClassification) {
    println!(
        "Health: {} (score {})",
        color_health_state(classification.health_state),
        classification.health_score
    );
    println!(
        "{} {}",
        mood_face(classification.mood),
        classification.coach_message
    );
}

fn status_label(status: ComponentStatus) -> &'static str {
    match status {
        ComponentStatus::Healthy => "healthy",
        ComponentStatus::Degraded => "degraded",
        ComponentStatus::Unhealthy => "unhealthy",
    }
}

/// Show the current monitoring state
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let state: MonitoringState = client.get("api/v1/monitoring").await?;

    if let OutputFormat::Json = format {
        print_json(&state);
        return Ok(());
    }

    match &state.session {
        Some(session) => println!("Session: {}", session),
        None => print_warning("No session attached"),
    }

    if let Some(simulation) = &state.simulation {
        print_info(&format!(
            "Simulating {} for {}s (started {})",
            simulation.scenario.as_str(),
            simulation.duration_secs,
            simulation.started_at.format("%H:%M:%S")
        ));
    }

    let Some(metrics) = &state.metrics else {
        print_warning("No metrics received yet");
        return Ok(());
    };

    println!();
    print_table(&channel_rows(metrics), format);
    println!(
        "Last update: {}",
        metrics.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if let Some(classification) = &state.classification {
        println!();
        print_classification(classification);
    }

    let open = state.alerts.unacknowledged().count();
    if open > 0 {
        println!();
        print_warning(&format!(
            "{} unacknowledged alert(s), run `dmon alerts` to view",
            open
        ));
    }

    Ok(())
}

/// Force one poll on the server
pub async fn refresh(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: RefreshResponse = client
        .post::<_, ()>("api/v1/monitoring/refresh", None)
        .await?;

    match format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Table => match response.outcome.as_deref() {
            Some("published") => print_success("Fresh metrics published"),
            Some("discarded") => print_info("Poll discarded, a simulation is active"),
            Some("failed") => print_warning("Poll failed, keeping last known state"),
            Some(other) => print_info(&format!("Poll outcome: {}", other)),
            None => print_warning("Nothing polled, attach a session first"),
        },
    }

    Ok(())
}

/// Classify a reading locally or on the server
pub async fn classify_sample(
    client: &ApiClient,
    cpu: f64,
    latency: f64,
    error_rate: f64,
    remote: bool,
    format: OutputFormat,
) -> Result<()> {
    if [cpu, latency, error_rate].iter().any(|v| !v.is_finite()) {
        anyhow::bail!("metric values must be finite numbers");
    }

    let sample = MetricSample::now(cpu, latency, error_rate);
    let classification = if remote {
        let path = format!(
            "api/v1/classify?cpuUsage={}&latency={}&errorRate={}",
            cpu, latency, error_rate
        );
        client.get::<HealthClassification>(&path).await?
    } else {
        classify(&sample)
    };

    match format {
        OutputFormat::Json => print_json(&classification),
        OutputFormat::Table => {
            print_table(&channel_rows(&sample), format);
            println!();
            print_classification(&classification);
        }
    }

    Ok(())
}

/// List the simulation presets
pub fn list_scenarios(format: OutputFormat) {
    let rows: Vec<ScenarioRow> = Scenario::ALL
        .iter()
        .map(|scenario| {
            let (cpu, latency, error_rate) = scenario.preset();
            ScenarioRow {
                name: scenario.as_str().to_string(),
                cpu: format_percent(cpu),
                latency: format_ms(latency),
                error_rate: format_percent(error_rate),
                description: scenario.description().to_string(),
            }
        })
        .collect();

    print_table(&rows, format);
}

/// Show server component health
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthResponse = client.get("healthz").await?;

    match format {
        OutputFormat::Json => print_json(&health),
        OutputFormat::Table => {
            println!("Overall: {}", color_status(status_label(health.status)));

            let rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(status_label(component.status)),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();

            print_table(&rows, format);
        }
    }

    Ok(())
}
