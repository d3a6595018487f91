mod config;
mod notify;
mod oracle;
mod policy;
mod scheduler;
mod web;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::{Config, ConfigError};
use crate::notify::{Dispatcher, NotifyError, SmtpMailer};
use crate::oracle::{OracleError, OverpassOracle, UsgsOracle};
use crate::policy::PolicyEngine;
use crate::scheduler::runner::SchedulerError;
use crate::scheduler::{FileLocationStore, LocationStore, NotificationScheduler};
use crate::web::AppState;

#[derive(Parser)]
#[command(name = "landsat-alert")]
#[command(about = "Email alerts ahead of predicted Landsat overpasses")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the notification scheduler and the HTTP API
    Serve {
        #[arg(long)]
        config: String,
    },
    /// Scan all notifiable locations once and exit
    Tick {
        #[arg(long)]
        config: String,
    },
    /// Print predicted overpasses for a coordinate
    Predict {
        #[arg(long)]
        config: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Days ahead to query, defaults to the configured lookahead
        #[arg(long)]
        days: Option<u32>,
    },
    /// Validate a configuration file and mail credentials
    Validate {
        #[arg(long)]
        config: String,
    },
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("prediction client error: {0}")]
    Oracle(#[from] OracleError),
    #[error("mail setup error: {0}")]
    Mail(#[from] NotifyError),
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid argument: {0}")]
    Argument(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config } => serve(&config).await,
        Commands::Tick { config } => tick(&config).await,
        Commands::Predict {
            config,
            lat,
            lon,
            days,
        } => predict(&config, lat, lon, days).await,
        Commands::Validate { config } => validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve(path: &str) -> Result<(), StartupError> {
    let config = Config::from_file(path)?;
    let oracle = build_oracle(&config)?;
    let store = build_store(&config);
    let mut scheduler = build_scheduler(&config, store.clone(), oracle.clone())?;
    scheduler.start()?;

    let scheduler = Arc::new(Mutex::new(scheduler));
    let bind_addr = config.web.bind.clone();
    let state = AppState {
        config: Arc::new(config),
        store,
        oracle,
        scheduler: scheduler.clone(),
    };

    let served = web::run_server(&bind_addr, state, shutdown_signal()).await;

    scheduler.lock().await.stop().await;
    served?;
    Ok(())
}

async fn tick(path: &str) -> Result<(), StartupError> {
    let config = Config::from_file(path)?;
    let oracle = build_oracle(&config)?;
    let scheduler = build_scheduler(&config, build_store(&config), oracle)?;

    let report = scheduler.run_tick(Utc::now()).await;
    println!(
        "Tick complete: {} visited, {} notified, {} skipped, {} failed",
        report.visited, report.notified, report.skipped, report.failed
    );
    Ok(())
}

async fn predict(path: &str, lat: f64, lon: f64, days: Option<u32>) -> Result<(), StartupError> {
    let config = Config::from_file(path)?;
    let oracle = build_oracle(&config)?;

    let start = Utc::now();
    let days = days.unwrap_or(config.oracle.lookahead_days);
    let end = start
        .checked_add_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| StartupError::Argument(format!("{} days ahead is out of range", days)))?;
    let passes = oracle.try_fetch(lat, lon, start, end).await?;

    println!(
        "{} overpasses for ({}, {}) until {}",
        passes.len(),
        lat,
        lon,
        end.format("%Y-%m-%d")
    );
    for pass in passes {
        println!("  {}", pass);
    }
    Ok(())
}

fn validate(path: &str) -> Result<(), StartupError> {
    let config = Config::from_file(path)?;
    SmtpMailer::from_config(&config.mail, config.mail.credentials()?)?;

    println!(
        "Configuration is valid ({} users, scan every {}h)",
        config.users.len(),
        config.scheduler.interval_hours
    );
    Ok(())
}

fn build_oracle(config: &Config) -> Result<Arc<dyn OverpassOracle>, StartupError> {
    let oracle = UsgsOracle::new(
        config.oracle.url.clone(),
        config.oracle.satellite,
        config.oracle.timeout()?,
    )?;
    Ok(Arc::new(oracle))
}

fn build_store(config: &Config) -> Arc<FileLocationStore> {
    Arc::new(FileLocationStore::new(
        config.storage.base_folder.clone(),
        config.user_emails(),
    ))
}

fn build_scheduler(
    config: &Config,
    store: Arc<dyn LocationStore>,
    oracle: Arc<dyn OverpassOracle>,
) -> Result<NotificationScheduler, StartupError> {
    let mailer = SmtpMailer::from_config(&config.mail, config.mail.credentials()?)?;
    let dispatcher = Dispatcher::new(
        Arc::new(mailer),
        config.mail.from.clone(),
        config.mail.subject.clone(),
    );

    Ok(NotificationScheduler::new(
        store,
        PolicyEngine::new(oracle),
        dispatcher,
        config.scheduler.interval(),
        config.scheduler.run_on_start,
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}
