//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the clinic REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging against the OpenAPI/Swagger UI. The workspace's main
//! `clinic-run` binary serves the same router.

use api_rest::{config_from_env, router, AppState, DEFAULT_REST_ADDR};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the clinic REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - see [`api_rest::config_from_env`] for storage and canvas settings
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let cfg = Arc::new(config_from_env()?);

    tracing::info!(
        "-- Starting clinic REST API on {} ({:?} storage at {})",
        addr,
        cfg.storage(),
        cfg.data_dir().display()
    );

    let app = router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
