//! API Configuration Module
//!
//! Server settings loaded from environment variables with development
//! defaults: bind address, store backend, CORS, request timeout and the swap
//! policy overrides.

use roster_core::SwapPolicy;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};

// ============================================================================
// STORE BACKEND
// ============================================================================

/// Which store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process-local store, lost on restart.
    #[default]
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            other => Err(ApiError::invalid_input(format!(
                "Unknown store backend '{}', expected memory or postgres",
                other
            ))),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to listen on.
    pub bind_host: String,
    pub port: u16,

    pub store: StoreBackend,

    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Upper bound on a single request, including the store round trips.
    pub request_timeout: Duration,

    pub policy: SwapPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            store: StoreBackend::Memory,
            cors_origins: Vec::new(),
            cors_max_age_secs: 86400,
            request_timeout: Duration::from_secs(30),
            policy: SwapPolicy::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ROSTER_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` or `ROSTER_API_PORT`: Listening port (default: 3000)
    /// - `ROSTER_STORE`: "memory" or "postgres" (default: memory)
    /// - `ROSTER_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `ROSTER_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `ROSTER_REQUEST_TIMEOUT_SECS`: Per-request timeout (default: 30)
    /// - `ROSTER_REQUIRE_ACTIVE_AGENTS`: "true" or "false" (default: true)
    /// - `ROSTER_MAX_MESSAGE_LEN`: Max characters in a comment (default: 2000)
    /// - `ROSTER_DEFAULT_LINE`: Post label reported for database rows stored without one (default: T8)
    ///
    /// Unparseable numbers and booleans fall back to their default; an
    /// unknown store backend or a policy that fails validation is an error.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_host = lookup("ROSTER_API_BIND").unwrap_or(defaults.bind_host);
        let port = match lookup("PORT").or_else(|| lookup("ROSTER_API_PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", raw)))?,
            None => defaults.port,
        };

        let store = match lookup("ROSTER_STORE") {
            Some(raw) => raw.parse()?,
            None => defaults.store,
        };

        let cors_origins = lookup("ROSTER_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = lookup("ROSTER_CORS_MAX_AGE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let request_timeout = lookup("ROSTER_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let mut policy = defaults.policy;
        if let Some(flag) = lookup("ROSTER_REQUIRE_ACTIVE_AGENTS").and_then(|s| parse_flag(&s)) {
            policy.require_active_agents = flag;
        }
        if let Some(len) = lookup("ROSTER_MAX_MESSAGE_LEN").and_then(|s| s.parse().ok()) {
            policy.max_message_len = len;
        }
        if let Some(line) = lookup("ROSTER_DEFAULT_LINE") {
            policy.default_line = line.trim().to_string();
        }
        policy
            .validate()
            .map_err(|e| ApiError::invalid_input(format!("Invalid swap policy: {}", e)))?;

        Ok(Self {
            bind_host,
            port,
            store,
            cors_origins,
            cors_max_age_secs,
            request_timeout,
            policy,
        })
    }

    /// Socket address the server listens on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
