//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use roster_exchange::SwapService;
use roster_storage::RosterStore;

use crate::config::StoreBackend;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: SwapService,
    pub backend: StoreBackend,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: SwapService, backend: StoreBackend) -> Self {
        Self {
            service,
            backend,
            start_time: Instant::now(),
        }
    }

    /// Build the service over `store` with the given policy.
    pub fn with_store(
        store: Arc<dyn RosterStore>,
        policy: roster_core::SwapPolicy,
        backend: StoreBackend,
    ) -> Self {
        Self::new(SwapService::new(store, policy), backend)
    }
}
