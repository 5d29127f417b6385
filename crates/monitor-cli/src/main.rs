//! Deploy dashboard monitor CLI
//!
//! A command-line tool for watching deployment health, raising simulated
//! incidents and acknowledging alerts on a running monitor server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{alerts, monitoring, session, simulate};
use monitor_lib::Scenario;

/// Deploy dashboard monitor CLI
#[derive(Parser)]
#[command(name = "dmon")]
#[command(author, version, about = "CLI for the deploy dashboard monitor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via DMON_API_URL env var)
    #[arg(long, env = "DMON_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show current metrics, health and simulation state
    Status,

    /// List alerts
    Alerts {
        /// Include acknowledged alerts
        #[arg(long)]
        all: bool,
    },

    /// Acknowledge an alert
    Ack {
        /// Alert ID
        id: String,
    },

    /// Simulate an incident scenario (cpu_spike, high_latency, error_burst)
    Simulate {
        scenario: Scenario,

        /// Seconds before the simulation recovers (server default if not specified)
        #[arg(long, short)]
        duration: Option<u64>,
    },

    /// Stop the active simulation early
    Stop,

    /// Poll the sample source immediately
    Refresh,

    /// Attach or detach the monitored session
    #[command(subcommand)]
    Session(SessionCommands),

    /// Classify a metric reading
    Classify {
        /// CPU usage in percent
        #[arg(long)]
        cpu: f64,

        /// Latency in milliseconds
        #[arg(long)]
        latency: f64,

        /// Error rate in percent
        #[arg(long)]
        error_rate: f64,

        /// Ask the server instead of classifying locally
        #[arg(long)]
        remote: bool,
    },

    /// List simulation scenarios
    Scenarios,

    /// Show server component health
    Health,

    /// Manage CLI configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Start monitoring a session
    Set {
        /// Session ID
        id: String,
    },

    /// Stop monitoring the current session
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,

    /// Persist defaults to the config file
    Set {
        /// API endpoint URL
        #[arg(long)]
        api_url: Option<String>,

        /// Default output format
        #[arg(long)]
        format: Option<output::OutputFormat>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load()?;
    let api_url = config.resolve_api_url(cli.api_url.clone());
    let format = config.resolve_format(cli.format);

    if cli.verbose {
        eprintln!("Using API at {}", api_url);
    }

    // Initialize client
    let client = client::ApiClient::new(&api_url)?;

    // Execute command
    match cli.command {
        Commands::Status => monitoring::show_status(&client, format).await?,
        Commands::Alerts { all } => alerts::list_alerts(&client, all, format).await?,
        Commands::Ack { id } => alerts::acknowledge(&client, &id, format).await?,
        Commands::Simulate { scenario, duration } => {
            simulate::start(&client, scenario, duration, format).await?;
        }
        Commands::Stop => simulate::stop(&client, format).await?,
        Commands::Refresh => monitoring::refresh(&client, format).await?,
        Commands::Session(session_cmd) => match session_cmd {
            SessionCommands::Set { id } => session::set(&client, &id, format).await?,
            SessionCommands::Clear => session::clear(&client, format).await?,
        },
        Commands::Classify {
            cpu,
            latency,
            error_rate,
            remote,
        } => {
            monitoring::classify_sample(&client, cpu, latency, error_rate, remote, format).await?;
        }
        Commands::Scenarios => monitoring::list_scenarios(format),
        Commands::Health => monitoring::show_health(&client, format).await?,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => {
                println!("API URL: {}", api_url);
                println!("Format:  {:?}", format);
                println!("File:    {}", config::Config::config_path()?.display());
            }
            ConfigCommands::Set {
                api_url,
                format: new_format,
            } => {
                let mut updated = config.clone();
                if let Some(url) = api_url {
                    url::Url::parse(&url)?;
                    updated.api_url = Some(url);
                }
                if let Some(f) = new_format {
                    updated.default_format = Some(format!("{:?}", f).to_lowercase());
                }
                let path = updated.save()?;
                output::print_success(&format!("Saved {}", path.display()));
            }
        },
    }

    Ok(())
}
