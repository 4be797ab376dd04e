#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! fleetsim daemon: owns the mission/position store and serves the GPS simulator.

use std::{net::SocketAddr, sync::Arc};

use clap::Parser;
use fleetsim_core::{sim::StepParams, validation::validate_step_params};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod http;
mod service;

use crate::config::DaemonConfig;
use crate::service::FleetService;

#[derive(Parser, Debug)]
#[command(name = "fleetsim-daemon", version, about = "GPS simulation service for fleet missions")]
struct Args {
    /// Listen address, e.g. 127.0.0.1:3000
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// SurrealDB endpoint: `surrealkv://<dir>` on disk, `mem://` for a throwaway store.
    #[arg(long, default_value = "surrealkv://.fleetsim/db")]
    db: String,

    /// Fraction of the remaining distance covered per simulation step.
    #[arg(long, default_value_t = 0.02)]
    step_fraction: f64,

    /// Width (degrees) of the uniform per-axis position noise.
    #[arg(long, default_value_t = 0.001)]
    jitter: f64,

    /// Remaining distance (degrees) under which a vehicle counts as arrived.
    #[arg(long, default_value_t = 0.01)]
    arrival_threshold: f64,

    /// Log level (env-filter syntax).
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DaemonConfig {
        listen: args.listen,
        db_endpoint: args.db,
        step: StepParams {
            step_fraction: args.step_fraction,
            jitter: args.jitter,
            arrival_threshold: args.arrival_threshold,
            ..StepParams::default()
        },
    };
    validate_step_params(&config.step)?;

    tracing::info!(?config, "starting daemon");

    let db = db::Db::connect(&config.db_endpoint).await?;
    db.apply_schema().await?;

    let svc = Arc::new(FleetService::new(db, config.step.clone()));
    let app = http::router(svc);

    tracing::info!(listen = %config.listen, "daemon listening");
    axum::serve(tokio::net::TcpListener::bind(config.listen).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown requested");
}
