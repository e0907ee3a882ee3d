//! FX Rates CLI
//!
//! Command-line interface for the FX rates workflow API.

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use fxrates_client::RatesClient;
use fxrates_types::{WorkflowId, WorkflowStatus};

#[derive(Parser)]
#[command(name = "fxrates")]
#[command(author, version, about = "FX rates workflow API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the rates API
    #[arg(
        long,
        env = "FXRATES_API_URL",
        default_value = "http://localhost:3000"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a rate workflow
    Start {
        /// Currency codes (comma-separated, e.g. EUR,USD,GBP)
        #[arg(long, value_delimiter = ',', required = true)]
        currencies: Vec<String>,
        /// Block until the workflow reaches a terminal state
        #[arg(long)]
        wait: bool,
        /// Poll interval in seconds while waiting
        #[arg(long, default_value = "1")]
        interval: u64,
    },
    /// Get the status of a workflow instance
    Status {
        /// Workflow instance ID (UUID)
        id: String,
    },
    /// Watch a workflow instance until it finishes
    Watch {
        /// Workflow instance ID (UUID)
        id: String,
        /// Poll interval in seconds
        #[arg(long, default_value = "1")]
        interval: u64,
    },
    /// Check API health
    Health,
}

fn parse_workflow_id(s: &str) -> Result<WorkflowId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid workflow ID: {}", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let client = RatesClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Start {
            currencies,
            wait,
            interval,
        } => {
            let codes: Vec<&str> = currencies.iter().map(String::as_str).collect();
            let accepted = client.start_workflow(&codes).await?;
            println!("{}", serde_json::to_string_pretty(&accepted)?);

            if wait {
                let finished = client
                    .wait_until_terminal(accepted.id, Duration::from_secs(interval))
                    .await?;
                println!("{}", serde_json::to_string_pretty(&finished)?);
                if finished.status == WorkflowStatus::Failed {
                    std::process::exit(1);
                }
            }
        }

        Commands::Status { id } => {
            let workflow_id = parse_workflow_id(&id)?;
            let status = client.workflow_status(workflow_id).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }

        Commands::Watch { id, interval } => {
            let workflow_id = parse_workflow_id(&id)?;
            let mut last: Option<WorkflowStatus> = None;
            loop {
                let status = client.workflow_status(workflow_id).await?;
                if last != Some(status.status) {
                    println!("{}", status.status);
                    last = Some(status.status);
                }
                if status.status.is_terminal() {
                    println!("{}", serde_json::to_string_pretty(&status)?);
                    if status.status == WorkflowStatus::Failed {
                        std::process::exit(1);
                    }
                    break;
                }
                tokio::time::sleep(Duration::from_secs(interval)).await;
            }
        }
    }

    Ok(())
}
