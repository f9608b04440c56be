//! Watch Later reconciler
//!
//! Reads tasks flagged for removal from a Notion database, removes the
//! referenced videos from the Watch Later playlist and writes the outcome
//! back to each task.

mod args;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wl_core::notion::NotionTaskSource;
use wl_core::task::TaskSource;
use wl_core::{ReconcileConfig, StrategyKind};
use wl_remover::{
    ApiRemoval, Credentials, PlaylistScanner, ReconciliationEngine, RemovalStrategy,
    RetryPolicy, UiAutomationRemoval, WebDriverLauncher, YouTubeClient,
};

use crate::args::{Args, Command};

const EXIT_FATAL: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wl_reconcile=info,wl_core=info,wl_remover=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match real_main(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn real_main(args: Args) -> Result<ExitCode> {
    let mut config =
        ReconcileConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }
    config.validate().context("Invalid configuration")?;

    let source = NotionTaskSource::new(config.notion.clone())
        .context("Failed to create Notion client")?;

    match args.command() {
        Command::Run { json } => run(config, source, json).await,
        Command::Pending => pending(&source).await,
        Command::CheckSource => check_source(&source).await,
    }
}

async fn build_strategy(config: &ReconcileConfig) -> Result<Box<dyn RemovalStrategy>> {
    match config.strategy {
        StrategyKind::Api => {
            let credentials = Credentials::load(&config.playlist.token_path)
                .await
                .with_context(|| {
                    format!(
                        "Failed to load OAuth credentials from {}",
                        config.playlist.token_path.display()
                    )
                })?;
            let client = YouTubeClient::new(&config.playlist, Arc::new(credentials))?;
            let scanner = PlaylistScanner::new(Arc::new(client));
            Ok(Box::new(ApiRemoval::new(
                scanner,
                config.playlist.playlist_id.clone(),
            )))
        }
        StrategyKind::Ui => {
            let launcher = WebDriverLauncher::new(config.ui.clone());
            Ok(Box::new(UiAutomationRemoval::new(
                Arc::new(launcher),
                config.ui.clone(),
            )))
        }
    }
}

async fn run(config: ReconcileConfig, source: NotionTaskSource, json: bool) -> Result<ExitCode> {
    let strategy = build_strategy(&config).await?;
    let engine = ReconciliationEngine::new(Arc::new(source), RetryPolicy::from(&config.retry));

    tracing::info!("Starting reconciliation with {} strategy", strategy.name());
    let result = tokio::select! {
        result = engine.run(strategy.as_ref()) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    let Some(result) = result else {
        tracing::warn!("Interrupted; tasks not yet processed stay pending");
        strategy.close().await;
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    };

    let report = result.context("Reconciliation failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(ExitCode::SUCCESS)
}

async fn pending(source: &NotionTaskSource) -> Result<ExitCode> {
    let tasks = source
        .query_pending()
        .await
        .context("Failed to query pending tasks")?;

    println!("{} pending task(s)", tasks.len());
    for task in &tasks {
        println!("  {} {} ({})", task.content_id, task.title, task.task_id);
    }
    Ok(ExitCode::SUCCESS)
}

async fn check_source(source: &NotionTaskSource) -> Result<ExitCode> {
    let info = source
        .check_database()
        .await
        .context("Task database is not reachable")?;

    println!("Database {} ({})", info.title, info.id);
    for (name, kind) in &info.properties {
        println!("  {}: {}", name, kind);
    }

    let problems = source.schema_problems(&info);
    if problems.is_empty() {
        println!("All configured properties are present");
        return Ok(ExitCode::SUCCESS);
    }
    for problem in &problems {
        println!("  problem: {}", problem);
    }
    Ok(ExitCode::from(EXIT_FATAL))
}
