use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use outage_watch::journal::{DailyLogFile, Journal};
use outage_watch::notify::{NoopBackend, NotifyBackend, SmtpMailer};
use outage_watch::{Config, Scheduler};
use pge_outage_client::OutageClient;

#[derive(Parser)]
#[command(name = "outage-watch", about = "Watches PGE planned outages for a street")]
struct Cli {
    /// Path to a dotenv file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Run a single check now and exit, ignoring trigger hours
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("outage_watch=info,pge_outage_client=info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Outage watch starting...");

    let config = Config::from_env(cli.env_file.as_deref()).context("Invalid configuration")?;
    config.log_redacted();

    let notifier: Arc<dyn NotifyBackend> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp).context("Invalid SMTP settings")?),
        None => {
            info!("No SMTP_HOST set, notifications disabled");
            Arc::new(NoopBackend)
        }
    };

    let journal: Arc<dyn Journal> = Arc::new(DailyLogFile::new(config.log_dir.clone()));
    let client = OutageClient::new().context("Failed to build outage API client")?;
    let scheduler = Scheduler::new(config, Arc::new(client), journal, notifier);

    if cli.once {
        let outcome = scheduler.check_now(Local::now().naive_local()).await;
        info!(outcome = ?outcome, "Single check complete");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                signal_token.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for interrupt"),
        }
    });

    scheduler.run(shutdown).await;
    Ok(())
}
