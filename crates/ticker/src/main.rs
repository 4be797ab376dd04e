#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! fleetsim ticker: drives the simulator by advancing missions on a fixed interval.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use fleetsim_core::api::{AdvanceRequest, AdvanceResponse, ErrorResponse};
use fleetsim_core::model::Mission;
use reqwest::StatusCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fleetsim-ticker")]
struct Args {
    /// Daemon base URL, e.g. http://127.0.0.1:3000
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    daemon: String,

    /// Mission to advance. Repeat for several; defaults to every in-progress mission.
    #[arg(long = "mission")]
    missions: Vec<String>,

    /// Tick interval in milliseconds.
    #[arg(long, default_value_t = 2_000, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: u64,

    /// Create a demo mission before ticking.
    #[arg(long)]
    demo: bool,

    /// Advance each mission once, then exit.
    #[arg(long)]
    once: bool,

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

    let client = reqwest::Client::new();
    let base = args.daemon.trim_end_matches('/').to_string();

    let mut missions = args.missions.clone();
    if args.demo {
        let mission = create_demo(&client, &base).await?;
        for (label, value) in mission.fields() {
            tracing::info!("{label}: {value}");
        }
        missions.push(mission.id);
    }
    if missions.is_empty() {
        missions = in_progress(&client, &base)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();
    }
    if missions.is_empty() {
        tracing::info!("no in-progress missions; nothing to do");
        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_millis(args.interval_ms));
    loop {
        interval.tick().await;

        // One call per mission per tick, in sequence, so a mission never has two
        // advances in flight.
        let mut tracked = Vec::with_capacity(missions.len());
        for mission_id in missions {
            if advance(&client, &base, &mission_id).await {
                tracked.push(mission_id);
            }
        }
        missions = tracked;

        if missions.is_empty() {
            tracing::info!("all missions finished");
            return Ok(());
        }
        if args.once {
            return Ok(());
        }
    }
}

/// Advance one mission. Returns whether it should stay tracked.
async fn advance(client: &reqwest::Client, base: &str, mission_id: &str) -> bool {
    let resp = match client
        .post(format!("{base}/v1/simulate-gps"))
        .json(&AdvanceRequest {
            mission_id: Some(mission_id.to_string()),
        })
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(mission_id, error = %e, "simulate-gps request failed");
            return true;
        }
    };

    let status = resp.status();
    if !status.is_success() {
        let message = match resp.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        let keep = keep_after_error(status);
        tracing::warn!(mission_id, status = %status, error = %message, keep, "simulate-gps rejected");
        return keep;
    }

    match resp.json::<AdvanceResponse>().await {
        Ok(AdvanceResponse::Moved(moved)) => {
            let p = &moved.position;
            tracing::info!(
                mission_id,
                seq = p.seq,
                lat = p.latitude,
                lng = p.longitude,
                speed = p.speed,
                heading = p.heading,
                distance_remaining = moved.distance_remaining,
                "vehicle moved"
            );
            true
        }
        Ok(AdvanceResponse::Arrived(arrived)) => {
            tracing::info!(mission_id, "{}", arrived.message);
            false
        }
        Err(e) => {
            tracing::warn!(mission_id, error = %e, "unreadable simulate-gps response");
            true
        }
    }
}

/// Unknown or inactive missions will keep failing the same way; anything else may be transient.
fn keep_after_error(status: StatusCode) -> bool {
    !matches!(status, StatusCode::NOT_FOUND | StatusCode::CONFLICT)
}

async fn create_demo(client: &reqwest::Client, base: &str) -> anyhow::Result<Mission> {
    let resp = client
        .post(format!("{base}/v1/demo/mission"))
        .send()
        .await
        .context("creating demo mission")?
        .error_for_status()
        .context("creating demo mission")?;
    resp.json::<Mission>()
        .await
        .context("decoding demo mission")
}

async fn in_progress(client: &reqwest::Client, base: &str) -> anyhow::Result<Vec<Mission>> {
    let resp = client
        .get(format!("{base}/v1/missions?status=in-progress"))
        .send()
        .await
        .context("listing missions")?
        .error_for_status()
        .context("listing missions")?;
    resp.json::<Vec<Mission>>()
        .await
        .context("decoding mission list")
}
