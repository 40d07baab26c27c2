use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logger::{LogFormat, init_tracing_with};
use resmon_service::{Config, Orchestrator, database};
use tracing::{error, info};

/// Resource monitor worker: runs the check and retention timers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "resmon-worker")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "RESMON_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Run both timers until interrupted (default)
    Run,
    /// Run a single check cycle and exit
    Check,
    /// Run a single retention sweep and exit
    Sweep,
    /// Print the effective configuration and exit
    Config,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::from_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_tracing_with(&config.logging.level, LogFormat::parse(&config.logging.format));

    if let Err(e) = run(cli.command.unwrap_or(Command::Run), config).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Config => println!("{config}"),
        Command::Check => {
            let report = build_orchestrator(&config).await?.check_resources().await?;
            info!(
                dispatched = report.dispatched,
                succeeded = report.succeeded,
                flipped = report.flipped,
                failed = report.failed,
                "Check cycle finished"
            );
        }
        Command::Sweep => {
            let deleted = build_orchestrator(&config).await?.delete_unrelevant_statuses().await?;
            info!(deleted, "Retention sweep finished");
        }
        Command::Run => {
            let mut orchestrator = build_orchestrator(&config).await?;
            info!(database = %config.database.path, "Starting resource monitor worker");
            orchestrator
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {e}");
                    }
                })
                .await;
        }
    }

    Ok(())
}

async fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let pool = database::connect(&config.database.path, config.database.max_connections).await?;
    Orchestrator::new(config, pool).context("failed to build orchestrator")
}
