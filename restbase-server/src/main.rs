use anyhow::{bail, Context, Result};
use clap::Parser;
use restbase_core::{log_info, set_log_level, LogLevel, Store};
use restbase_server::routes;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "restbase")]
#[command(about = "Serve a JSON file as a queryable REST API")]
#[command(version)]
struct Cli {
    /// JSON data file: { "products": [ ... ], "profile": { ... } }
    data: PathBuf,

    /// Directory of per-resource schemas (<resource>.schema.json)
    #[arg(long)]
    schemas: Option<PathBuf>,

    /// Bind address
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Log level: error, warn, info, debug
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match LogLevel::from_str(&cli.log_level) {
        Some(level) => set_log_level(level),
        None => bail!("Unknown log level: {}", cli.log_level),
    }

    let mut store = Store::load(&cli.data)
        .with_context(|| format!("Failed to load data file: {}", cli.data.display()))?;

    if let Some(dir) = &cli.schemas {
        store
            .load_schemas(dir)
            .with_context(|| format!("Failed to load schemas from: {}", dir.display()))?;
    }

    let store = Arc::new(store);
    let app = routes::build_router(store).context("Failed to build resource routes")?;

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;
    log_info!("serving {} on http://{}", cli.data.display(), cli.bind);

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
