#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::{App, HttpServer, web};
use clap::Parser;

mod error;
mod routes;

use error::AppError;
use logger::{LogFormat, init_tracing_with};
use resmon_service::{Config, Orchestrator, ResourceService, database};
use tracing::info;

/// HTTP API over the resource registry
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "resmon-server")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "RESMON_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_config(cli.config.as_deref())?;
    init_tracing_with(&config.logging.level, LogFormat::parse(&config.logging.format));

    let pool = database::connect(&config.database.path, config.database.max_connections).await?;
    let service = Orchestrator::new(&config, pool)?.resource_service();

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    run_server(addr, web::Data::new(service)).await
}

async fn run_server(addr: SocketAddr, service: web::Data<ResourceService>) -> Result<(), AppError> {
    info!(%addr, "Starting HTTP API");
    HttpServer::new(move || App::new().app_data(service.clone()).configure(routes::routes))
        .bind(addr)?
        .run()
        .await?;

    Ok(())
}
