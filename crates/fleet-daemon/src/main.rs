//! fakefleetd entry point.
//!
//! This file is intentionally thin: it sets up tracing, parses options,
//! spawns the dispatcher and signal listener, wires middleware, and starts
//! the HTTP server. Route handlers live in `routes.rs`; shared state types
//! live in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use fleet_daemon::{dispatcher, routes, state};
use fleet_engine::EngineOptions;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

/// Fake control plane for a cluster-orchestrator product. Stands in for
/// the real backend so client tooling can be integration-tested without a
/// live cluster.
#[derive(Parser)]
#[command(name = "fakefleetd")]
struct Cli {
    /// Port for the control API.
    #[arg(long, default_value_t = 17070)]
    port: u16,

    /// Default OS series for machines.
    #[arg(long, default_value = "noble")]
    series: String,

    /// Automatically create machines for units that don't have one.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    auto_start_machines: bool,

    /// Simulated machine startup delay, in milliseconds.
    #[arg(long, default_value_t = 50)]
    startup_delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if absent.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();
    let cli = Cli::parse();

    let options = EngineOptions {
        series: cli.series,
        auto_create_machines: cli.auto_start_machines,
        startup_delay: Duration::from_millis(cli.startup_delay_ms),
        ..EngineOptions::default()
    };

    let (control, status, dispatcher_task) = dispatcher::Dispatcher::spawn(options);
    dispatcher::spawn_signal_listener(control.clone());

    let shared = Arc::new(state::AppState::new(control, status));
    let app = routes::build_router(shared).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let addr = bind_addr_from_env()
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], cli.port)));
    info!("fakefleetd listening on http://{}", addr);

    // The server drains once the dispatcher processed a Stop, so signal-
    // driven shutdown and an explicit stop both end the process cleanly.
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async move {
            let _ = dispatcher_task.await;
        })
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("FAKEFLEET_ADDR").ok()?.parse().ok()
}
