//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build subsystems (clients, breakers) before accepting traffic
//! - Bind the listener last
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - An invalid breaker configuration never starts the server

use std::path::Path;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, AggregatorConfig, ConfigError};
use crate::resilience::BreakerConfigError;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("circuit breaker configuration error: {0}")]
    Breaker(#[from] BreakerConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load config from `path`, or fall back to defaults when none is given.
pub fn resolve_config(path: Option<&Path>) -> Result<AggregatorConfig, StartupError> {
    match path {
        Some(path) => {
            let config = load_config(path)?;
            tracing::info!(path = %path.display(), "Configuration loaded");
            Ok(config)
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Ok(AggregatorConfig::default())
        }
    }
}

/// Bind the main listener.
pub async fn bind_listener(config: &AggregatorConfig) -> Result<TcpListener, StartupError> {
    let address = &config.listener.bind_address;
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })
}
