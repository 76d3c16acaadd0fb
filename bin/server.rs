// School Registry - Web Server

use anyhow::{Context, Result};
use clap::Parser;
use school_registry::api::{app, AppState};
use school_registry::{init_logging, open_database, Config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "school-server")]
#[command(about = "JSON API for the school establishment registry", long_about = None)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    db: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:3000
    #[arg(long)]
    bind: Option<String>,

    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?.with_overrides(args.db, args.bind, args.log_level);
    init_logging(&config);

    let conn = open_database(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;
    log::info!("database opened: {}", config.database_path.display());

    let router = app(AppState::new(conn));

    let listener = tokio::net::TcpListener::bind(config.bind_address.as_str())
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;

    log::info!("server running on http://{}", config.bind_address);
    log::info!("API: http://{}/api/establishments", config.bind_address);

    axum::serve(listener, router)
        .await
        .context("Server error")?;

    Ok(())
}
