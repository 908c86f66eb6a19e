//! Signalgen Verifier CLI
//!
//! Command-line interface for running verification checks against the
//! observability backends through the Grafana dashboard API.
//!
//! # Usage
//!
//! ```bash
//! signalgen-verifier list
//! signalgen-verifier run
//! signalgen-verifier run --check clickhouse-logs --check prometheus-metrics
//! ```

#![deny(unsafe_code)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::verify::RetryPolicy;
use verifier::{Check, CheckRunner, GrafanaClient, GrafanaConfig};

/// Signalgen verifier - backend verification through the dashboard API
#[derive(Parser)]
#[command(name = "signalgen-verifier")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Grafana base URL
    #[arg(
        short,
        long,
        env = "GRAFANA_URL",
        default_value = "http://localhost:3000"
    )]
    grafana_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run verification checks (all of them by default)
    Run {
        /// Run only the named checks; repeatable
        #[arg(short, long)]
        check: Vec<String>,
    },
    /// List available checks
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => {
            for check in Check::ALL {
                println!("{check}");
            }
            Ok(())
        }
        Some(Commands::Run { check }) => run_checks(&cli.grafana_url, &check).await,
        None => run_checks(&cli.grafana_url, &[]).await,
    }
}

async fn run_checks(grafana_url: &str, names: &[String]) -> Result<()> {
    let checks = resolve_checks(names)?;

    let mut config = GrafanaConfig::from_env()?;
    config.url = grafana_url.to_string();

    let client = GrafanaClient::new(&config)?;
    let runner = CheckRunner::new(client, RetryPolicy::default());

    println!("Running {} check(s) against {grafana_url}...", checks.len());
    let summary = runner.run_many(&checks).await;

    for check in &summary.passed {
        println!("PASS {check}");
    }
    for (check, message) in &summary.failed {
        println!("FAIL {check}: {message}");
    }

    anyhow::ensure!(
        summary.all_passed(),
        "{} of {} check(s) failed",
        summary.failed.len(),
        checks.len()
    );
    Ok(())
}

fn resolve_checks(names: &[String]) -> Result<Vec<Check>> {
    if names.is_empty() {
        return Ok(Check::ALL.to_vec());
    }

    names
        .iter()
        .map(|name| {
            Check::from_name(name).ok_or_else(|| {
                let known = Check::ALL.map(Check::name).join(", ");
                anyhow::anyhow!("Unknown check '{name}'; known checks: {known}")
            })
        })
        .collect()
}
