use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    operations::{describe_outcome, run_operation},
    HttpInboxApi, InboxApi, OperationKind, OperationParams,
};
use shared::domain::Category;
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod watch;

#[derive(Parser, Debug)]
#[command(name = "inboxpilot", about = "Terminal dashboard for the InboxPilot backend")]
struct Cli {
    /// Settings file; missing files are ignored.
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Overrides the configured backend base URL.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Live dashboard driven by stdin commands (default).
    Watch,
    /// Fetch once and print the categorized inbox.
    List { category: Option<Category> },
    Scan {
        #[arg(long)]
        max_emails: Option<u32>,
    },
    Recategorize,
    Schedule {
        #[arg(long)]
        delay: Option<f64>,
    },
    Stats,
    Queue,
    SchedulerStatus,
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = config::load_settings(&cli.config);
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }

    let api = HttpInboxApi::with_timeout(&settings.api_base_url, settings.request_timeout())
        .context("failed to build backend client")?;
    tracing::info!(api = %api.base_url(), "using backend");

    let params = settings.operation_params();
    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch::run(Arc::new(api), settings.controller_settings()).await?,
        Command::List { category } => {
            let snapshot = api
                .fetch_snapshot()
                .await
                .context("failed to fetch emails")?;
            print!("{}", render::dashboard(&snapshot, category));
        }
        Command::Scan { max_emails } => {
            let params = OperationParams {
                scan_max_emails: max_emails.unwrap_or(params.scan_max_emails),
                ..params
            };
            run_once(&api, OperationKind::Scan, params).await?;
        }
        Command::Recategorize => run_once(&api, OperationKind::Recategorize, params).await?,
        Command::Schedule { delay } => {
            let params = OperationParams {
                scheduler_delay_secs: delay.unwrap_or(params.scheduler_delay_secs),
                ..params
            };
            run_once(&api, OperationKind::Schedule, params).await?;
        }
        Command::Stats => {
            let stats = api.stats().await.context("failed to fetch stats")?;
            println!("{}", render::stats(&stats));
        }
        Command::Queue => {
            let queue = api
                .action_queue()
                .await
                .context("failed to fetch action queue")?;
            println!("{}", render::action_queue(&queue));
        }
        Command::SchedulerStatus => {
            let status = api
                .scheduler_status()
                .await
                .context("failed to fetch scheduler status")?;
            println!("{}", render::scheduler_status(&status));
        }
        Command::Health => {
            let health = api.health().await.context("health check failed")?;
            println!("{}", render::health(&health));
        }
    }

    Ok(())
}

async fn run_once(api: &dyn InboxApi, kind: OperationKind, params: OperationParams) -> Result<()> {
    let result = run_operation(api, kind, params).await;
    let outcome = describe_outcome(kind, &result);
    println!("{}", outcome.message());
    if !outcome.is_success() {
        bail!("{kind} did not succeed");
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
