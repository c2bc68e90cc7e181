//! REST API server example for the ad engine.
//!
//! Run with: `cargo run --example server -- [--config engine.toml] [--port 3000]`
//!
//! ## Example Usage
//!
//! ```bash
//! # Create a line item
//! curl -X POST http://localhost:3000/line-items \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Summer Sale", "advertiser_id": "adv_1", "bid": "2.50", "budget": "100.00",
//!        "placement": "homepage_top", "categories": ["sports"], "keywords": ["shoes"]}'
//!
//! # Run an auction
//! curl "http://localhost:3000/ads?placement=homepage_top&category=sports&limit=2"
//!
//! # Report an impression
//! curl -X POST http://localhost:3000/tracking \
//!   -H "Content-Type: application/json" \
//!   -d '{"event_type": "impression", "line_item_id": "li_..."}'
//! ```

use adserver_demo_rs::http::{AppState, serve};
use adserver_demo_rs::{AdEngine, EngineConfig};
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "adserver-demo-server")]
struct Args {
    /// Optional TOML engine configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Log filter directive
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "failed to load config");
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let state = AppState::new(AdEngine::with_config(config));

    let listener = match TcpListener::bind(("127.0.0.1", args.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, port = args.port, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(port = args.port, "ad server running on http://127.0.0.1:{}", args.port);

    if let Err(e) = serve(listener, state).await {
        error!(error = %e, "server stopped");
    }
}
