//! Session attach/detach commands

use anyhow::Result;
use monitor_lib::MonitoringState;

use crate::client::{ApiClient, DetachResponse, SessionRequest};
use crate::output::{print_info, print_json, print_success, OutputFormat};

pub async fn set(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let request = SessionRequest {
        session_id: id.to_string(),
    };
    let state: MonitoringState = client.put("api/v1/session", &request).await?;

    match format {
        OutputFormat::Json => print_json(&state),
        OutputFormat::Table => {
            print_success(&format!("Monitoring session {}", id));
            if state.metrics.is_some() {
                print_info("First sample received, run `dmon status` to view");
            }
        }
    }

    Ok(())
}

pub async fn clear(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: DetachResponse = client.delete("api/v1/session").await?;

    match format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Table => {
            if response.detached {
                print_success("Session detached, monitoring stopped");
            } else {
                print_info("No session was attached");
            }
        }
    }

    Ok(())
}
