//! Simulation commands

use anyhow::Result;
use monitor_lib::{MonitoringState, Scenario};

use crate::client::{ApiClient, StartSimulationRequest, StopResponse};
use crate::output::{color_health_state, print_info, print_json, print_success, OutputFormat};

/// Start a scenario simulation
pub async fn start(
    client: &ApiClient,
    scenario: Scenario,
    duration: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let request = StartSimulationRequest {
        scenario: scenario.as_str().to_string(),
        duration,
    };

    let state: MonitoringState = client
        .post("api/v1/monitoring/simulate/start", Some(&request))
        .await?;

    match format {
        OutputFormat::Json => print_json(&state),
        OutputFormat::Table => {
            let secs = state
                .simulation
                .as_ref()
                .map(|s| s.duration_secs)
                .or(duration);
            match secs {
                Some(secs) => print_success(&format!(
                    "Simulating {} for {}s",
                    scenario.as_str(),
                    secs
                )),
                None => print_success(&format!("Simulating {}", scenario.as_str())),
            }
            if let Some(classification) = &state.classification {
                println!(
                    "Health: {} (score {})",
                    color_health_state(classification.health_state),
                    classification.health_score
                );
                println!("{}", classification.coach_message);
            }
        }
    }

    Ok(())
}

/// Stop the active simulation early
pub async fn stop(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: StopResponse = client
        .post::<_, ()>("api/v1/monitoring/simulate/stop", None)
        .await?;

    match format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Table => {
            if response.stopped {
                print_success("Simulation stopped, live polling resumed");
            } else {
                print_info("No simulation was running");
            }
        }
    }

    Ok(())
}
