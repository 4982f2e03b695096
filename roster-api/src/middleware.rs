//! Caller identity extraction.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! account in the `x-roster-agent-id` header. Handlers take a [`Caller`]
//! argument and never see requests without one.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use roster_core::AgentId;
use std::str::FromStr;

use crate::error::ApiError;

/// Header carrying the authenticated agent's identifier.
pub const CALLER_HEADER: &str = "x-roster-agent-id";

/// The authenticated account issuing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub AgentId);

impl Caller {
    pub fn agent_id(&self) -> AgentId {
        self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_HEADER)
            .ok_or_else(|| ApiError::unauthorized(format!("Missing {} header", CALLER_HEADER)))?
            .to_str()
            .map_err(|_| ApiError::invalid_format(CALLER_HEADER, "visible ASCII"))?;

        let agent_id = AgentId::from_str(raw.trim()).map_err(|e| {
            tracing::debug!(header = raw, error = %e, "Rejected caller header");
            ApiError::invalid_format(CALLER_HEADER, "agent UUID")
        })?;
        Ok(Caller(agent_id))
    }
}
