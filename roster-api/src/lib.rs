//! ROSTER API - HTTP Layer
//!
//! Axum routes over [`roster_exchange::SwapService`], caller identity
//! extraction, error mapping, environment configuration, tracing setup and
//! [`PgStore`], the PostgreSQL implementation of the storage contracts.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

use std::sync::Arc;

use roster_storage::{MemoryStore, RosterStore};

// Re-export commonly used types
pub use config::{ApiConfig, StoreBackend};
pub use db::{DbConfig, PgStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{Caller, CALLER_HEADER};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
pub use types::*;

/// Open the store selected by `config` and wrap it in the swap service.
///
/// The PostgreSQL store reads its connection settings from the environment
/// and applies the schema before serving.
pub async fn build_state(config: &ApiConfig) -> ApiResult<AppState> {
    let store: Arc<dyn RosterStore> = match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Postgres => {
            let db_config = DbConfig::from_env();
            let store = PgStore::from_config(&db_config)?
                .with_default_line(config.policy.default_line.clone());
            store.apply_schema().await?;
            tracing::info!(
                host = %db_config.host,
                dbname = %db_config.dbname,
                pool_size = db_config.max_size,
                "Connected to PostgreSQL"
            );
            Arc::new(store)
        }
    };
    Ok(AppState::with_store(store, config.policy.clone(), config.store))
}
