//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use monitor_lib::{AlertLevel, HealthState, Mood};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&items),
    }
}

/// Print any value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a percentage value
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Format a metric reading by its unit
pub fn format_with_unit(value: f64, unit: &str) -> String {
    match unit {
        "%" => format_percent(value),
        "ms" => format_ms(value),
        _ => format!("{:.1} {}", value, unit),
    }
}

/// Format milliseconds
pub fn format_ms(value: f64) -> String {
    if value >= 1000.0 {
        format!("{:.2}s", value / 1000.0)
    } else {
        format!("{:.0}ms", value)
    }
}

/// Color a health state
pub fn color_health_state(state: HealthState) -> String {
    let label = state.to_string();
    match state {
        HealthState::Healthy => label.green().to_string(),
        HealthState::Warning => label.yellow().to_string(),
        HealthState::Danger => label.red().bold().to_string(),
    }
}

/// Color an alert level
pub fn color_level(level: AlertLevel) -> String {
    let label = level.to_string();
    match level {
        AlertLevel::Info => label.blue().to_string(),
        AlertLevel::Warning => label.yellow().to_string(),
        AlertLevel::Critical => label.red().bold().to_string(),
    }
}

/// Color component status from the health endpoint
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "running" => status.green().to_string(),
        "degraded" | "warning" => status.yellow().to_string(),
        "unhealthy" | "error" | "failed" | "danger" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Face shown next to the coach message
pub fn mood_face(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "(^_^)",
        Mood::Worried => "(o_o;)",
        Mood::Crying => "(T_T)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(250.0), "250ms");
        assert_eq!(format_ms(1500.0), "1.50s");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(8.0), "8.0%");
        assert_eq!(format_percent(0.55), "0.6%");
    }

    #[test]
    fn test_format_with_unit() {
        assert_eq!(format_with_unit(85.0, "%"), "85.0%");
        assert_eq!(format_with_unit(850.0, "ms"), "850ms");
        assert_eq!(format_with_unit(2.5, "req/s"), "2.5 req/s");
    }

    #[test]
    fn test_color_keeps_label() {
        colored::control::set_override(false);
        assert_eq!(color_health_state(HealthState::Danger), "danger");
        assert_eq!(color_level(AlertLevel::Critical), "critical");
        assert_eq!(color_status("degraded"), "degraded");
    }
}
