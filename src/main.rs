use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, DEFAULT_REST_ADDR, config_from_env, router};
use clinic_core::StorageMode;

/// Main entry point for the clinic application
///
/// Serves the REST API (with Swagger UI at `/swagger-ui/`) until Ctrl-C.
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Directory for YAML document storage (default: "clinic_data")
/// - `CLINIC_STORE`: `yaml` or `memory` (default: "yaml")
/// - `CLINIC_CANVAS_WIDTH`, `CLINIC_CANVAS_HEIGHT`, `CLINIC_CANVAS_BACKGROUND`: annotation canvas
/// - `CLINIC_RX_PREFIX`: prescription number prefix (default: "RX")
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let cfg = Arc::new(config_from_env()?);

    if cfg.storage() == StorageMode::Memory {
        tracing::warn!("in-memory storage: records are lost when the server stops");
    }
    tracing::info!(
        "-- Starting clinic REST server on {} (data: {})",
        rest_addr,
        cfg.data_dir().display()
    );

    let app = router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("-- Shutting down");
        })
        .await?;

    Ok(())
}
