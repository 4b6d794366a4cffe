//! # hermod
//!
//! Real-time chat message routing server.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! hermod
//!
//! # Run with a config file at ./hermod.toml
//! hermod
//!
//! # Run with environment variables
//! HERMOD_PORT=8080 HERMOD_HOST=0.0.0.0 hermod
//! ```

mod auth;
mod config;
mod handlers;
mod metrics;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hermod=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;

    tracing::info!("Starting hermod server on {}:{}", config.host, config.port);

    // Initialize metrics
    metrics::init_metrics();

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}
