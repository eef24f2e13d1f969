use anyhow::Context;
use chrono::Local;

use headcount_report::channels::Delivery;
use headcount_report::config::ReportConfig;
use headcount_report::pipeline::{ReportRunner, RunOutcome};

const BANNER_WIDTH: usize = 60;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let banner = "=".repeat(BANNER_WIDTH);
    tracing::info!("{banner}");
    tracing::info!("Starting headcount report v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("{banner}");

    match run().await {
        Ok(outcome) => {
            tracing::info!("{banner}");
            match outcome {
                RunOutcome::NothingToSend(reason) => {
                    tracing::info!(?reason, "Nothing to send; exiting");
                }
                RunOutcome::Completed {
                    rows,
                    delivery: Delivery::Sent { subject, to, cc },
                } => {
                    tracing::info!(rows, to, cc, subject = %subject, "Report sent");
                }
                RunOutcome::Completed {
                    rows,
                    delivery: Delivery::Skipped,
                } => {
                    tracing::info!(rows, "Report generated; email skipped");
                }
            }
            tracing::info!("Headcount report completed successfully");
            tracing::info!("{banner}");
            Ok(())
        }
        Err(e) => {
            tracing::error!("{banner}");
            tracing::error!("Headcount report failed: {e:#}");
            tracing::error!("{banner}");
            Err(e)
        }
    }
}

async fn run() -> anyhow::Result<RunOutcome> {
    let config = ReportConfig::from_env().context("Failed to load configuration")?;
    let runner = ReportRunner::from_config(config)?;
    let today = Local::now().date_naive();
    let outcome = runner.run(today).await?;
    Ok(outcome)
}
