//! Request and response bodies of the HTTP surface.
//!
//! Domain types from `roster-core` are serialized as-is; this module only
//! adds the envelopes and query parameter shapes.

use chrono::NaiveDate;
use roster_core::{
    Agent, AgentResponse, AuditEntry, DateRange, Involvement, Role, ShiftRecord,
    SupervisorDecision, SwapFilter, SwapRequest, SwapStatus,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// REQUEST BODIES
// ============================================================================

/// Body of `POST /swaps/{id}/respond`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RespondRequest {
    pub action: AgentResponse,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Body of `POST /swaps/{id}/decision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DecisionRequest {
    pub action: SupervisorDecision,
    #[serde(default)]
    pub comment: Option<String>,
}

// ============================================================================
// QUERY PARAMETERS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListSwapsParams {
    pub status: Option<SwapStatus>,
    pub involvement: Option<Involvement>,
}

impl From<ListSwapsParams> for SwapFilter {
    fn from(params: ListSwapsParams) -> Self {
        SwapFilter {
            status: params.status,
            involvement: params.involvement.unwrap_or_default(),
        }
    }
}

/// Inclusive day range, both ends optional.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DateRangeParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl From<DateRangeParams> for DateRange {
    fn from(params: DateRangeParams) -> Self {
        DateRange::new(params.from, params.to)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListAgentsParams {
    pub role: Option<Role>,
}

// ============================================================================
// RESPONSE ENVELOPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListSwapsResponse {
    pub swaps: Vec<SwapRequest>,
    pub total: usize,
}

impl From<Vec<SwapRequest>> for ListSwapsResponse {
    fn from(swaps: Vec<SwapRequest>) -> Self {
        let total = swaps.len();
        Self { swaps, total }
    }
}

/// Audit trail of one request, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SwapHistoryResponse {
    pub entries: Vec<AuditEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListAgentsResponse {
    pub agents: Vec<Agent>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListShiftsResponse {
    pub shifts: Vec<ShiftRecord>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respond_request_accepts_legacy_verbs() {
        let body: RespondRequest = serde_json::from_str(r#"{"action": "refuser"}"#).unwrap();
        assert_eq!(body.action, AgentResponse::Refuse);
        assert_eq!(body.comment, None);

        let body: DecisionRequest =
            serde_json::from_str(r#"{"action": "validate", "comment": "ok"}"#).unwrap();
        assert_eq!(body.action, SupervisorDecision::Validate);
        assert_eq!(body.comment.as_deref(), Some("ok"));
    }

    #[test]
    fn test_list_params_default_to_any_involvement() {
        let filter = SwapFilter::from(ListSwapsParams {
            status: Some(SwapStatus::Pending),
            involvement: None,
        });
        assert_eq!(filter.involvement, Involvement::Any);
        assert_eq!(filter.status, Some(SwapStatus::Pending));
    }
}
