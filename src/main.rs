//! Trip Aggregator
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                                                      │
//!                       │                  TRIP AGGREGATOR                     │
//!                       │                                                      │
//!   Client Request      │  ┌────────┐   ┌──────────┐   ┌────────────┐          │
//!   ────────────────────┼─▶│  http  │──▶│ handlers │──▶│ aggregator │          │
//!                       │  │ server │   │ validate │   │  service   │          │
//!                       │  └────────┘   └──────────┘   └─────┬──────┘          │
//!                       │                                    │                 │
//!                       │        ┌──────────────┬────────────┼─────────────┐   │
//!                       │        ▼              ▼            ▼             ▼   │
//!                       │     flights        hotels     ┌─────────┐  events    │
//!                       │                               │ breaker │            │
//!                       │                               └────┬────┘            │
//!                       │                                    ▼                 │
//!                       │                                 weather              │
//!                       │                                                      │
//!                       │  config · observability · lifecycle                  │
//!                       │                                                      │
//!                       └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use trip_aggregator::lifecycle::startup::{bind_listener, resolve_config};
use trip_aggregator::observability::{logging, metrics};
use trip_aggregator::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "trip-aggregator", version, about = "Trip search aggregator")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logging needs the config, so config errors before this point go to stderr.
    let config = resolve_config(args.config.as_deref())?;
    logging::init_logging(&config.observability)?;

    tracing::info!("trip-aggregator v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        weather_timeout_ms = config.timeouts.weather_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config)?;
    let listener = bind_listener(server.config()).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
