//! Alert listing and acknowledgement

use anyhow::Result;
use monitor_lib::{Alert, MonitoringState};
use tabled::Tabled;

use crate::client::{AckResponse, ApiClient};
use crate::output::{color_level, print_json, print_success, print_table, print_warning, OutputFormat};

/// Row for alerts table
#[derive(Tabled, serde::Serialize)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Ack")]
    acknowledged: String,
}

/// List alerts, newest first; unacknowledged only unless `all`
pub async fn list_alerts(client: &ApiClient, all: bool, format: OutputFormat) -> Result<()> {
    let state: MonitoringState = client.get("api/v1/monitoring").await?;

    let alerts: Vec<Alert> = state
        .alerts
        .into_vec()
        .into_iter()
        .filter(|a| all || !a.acknowledged)
        .collect();

    match format {
        OutputFormat::Json => print_json(&alerts),
        OutputFormat::Table => {
            if alerts.is_empty() {
                print_warning(if all {
                    "No alerts"
                } else {
                    "No unacknowledged alerts"
                });
                return Ok(());
            }

            let rows: Vec<AlertRow> = alerts
                .iter()
                .map(|a| AlertRow {
                    id: a.id.clone(),
                    level: color_level(a.level),
                    message: a.message.clone(),
                    time: a.timestamp.format("%H:%M:%S").to_string(),
                    acknowledged: if a.acknowledged {
                        "✓".to_string()
                    } else {
                        String::new()
                    },
                })
                .collect();

            print_table(&rows, format);
            println!("\nTotal: {} alerts", rows.len());
        }
    }

    Ok(())
}

/// Acknowledge an alert by id
pub async fn acknowledge(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let path = format!("api/v1/alerts/{}/ack", id);
    let response: AckResponse = client.post::<_, ()>(&path, None).await?;

    match format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Table => {
            if response.acknowledged {
                print_success(&format!("Alert {} acknowledged", id));
            } else {
                print_warning(&format!("No alert with id {}", id));
            }
        }
    }

    Ok(())
}
