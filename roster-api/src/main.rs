//! ROSTER API Server Entry Point
//!
//! Loads configuration from the environment, opens the configured store and
//! serves the Axum router until interrupted.

use roster_api::telemetry::{init_tracing, LogFormat};
use roster_api::{build_state, create_router, ApiConfig, ApiError, ApiResult};

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing(LogFormat::from_env())?;

    let config = ApiConfig::from_env()?;
    let state = build_state(&config).await?;
    let app = create_router(state, &config);

    let addr = config.bind_addr()?;
    tracing::info!(%addr, store = ?config.store, "Starting ROSTER API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
