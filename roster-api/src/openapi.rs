//! OpenAPI Specification for the ROSTER API
//!
//! Generated by utoipa from the route annotations and the `ToSchema`
//! derives in `roster-core`.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::{health, schedule, swap};
use crate::types::{
    DecisionRequest, ListAgentsResponse, ListShiftsResponse, ListSwapsResponse, RespondRequest,
    SwapHistoryResponse,
};

use roster_core::{
    Agent, AgentId, AgentResponse, AuditAction, AuditEntry, AuditEntryId, DateRange, EntityType,
    Involvement, Role, ServiceType, ShiftId, ShiftRecord, SupervisorDecision, SwapDraft, SwapId,
    SwapRequest, SwapStatistics, SwapStatus,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ROSTER API",
        version = "0.1.0",
        description = "Two-stage shift swap approval: agent-to-agent proposal, recipient answer, supervisor decision and atomic exchange of the two schedule records",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Swaps", description = "Swap requests, their transitions and audit trail"),
        (name = "Directory", description = "Active accounts and their schedules"),
        (name = "Health", description = "Liveness and readiness probes"),
    ),
    paths(
        swap::create_swap,
        swap::list_swaps,
        swap::list_actionable,
        swap::statistics,
        swap::get_swap,
        swap::history,
        swap::respond,
        swap::decide,
        swap::cancel,
        schedule::list_agents,
        schedule::list_agent_shifts,
        health::ping,
        health::readiness,
    ),
    components(schemas(
        SwapRequest,
        SwapDraft,
        SwapStatus,
        AgentResponse,
        SupervisorDecision,
        Involvement,
        AuditEntry,
        AuditAction,
        SwapStatistics,
        DateRange,
        Agent,
        Role,
        ShiftRecord,
        ServiceType,
        EntityType,
        AgentId,
        ShiftId,
        SwapId,
        AuditEntryId,
        RespondRequest,
        DecisionRequest,
        ListSwapsResponse,
        SwapHistoryResponse,
        ListAgentsResponse,
        ListShiftsResponse,
        health::HealthResponse,
        health::HealthStatus,
        ApiError,
        ErrorCode,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/swaps",
            "/api/v1/swaps/actionable",
            "/api/v1/swaps/statistics",
            "/api/v1/swaps/{id}",
            "/api/v1/swaps/{id}/history",
            "/api/v1/swaps/{id}/respond",
            "/api/v1/swaps/{id}/decision",
            "/api/v1/swaps/{id}/cancel",
            "/api/v1/agents",
            "/api/v1/agents/{id}/shifts",
            "/health/ping",
            "/health/ready",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_openapi_serializes_to_json() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(json["info"]["title"], "ROSTER API");
        assert!(json["components"]["schemas"]["SwapRequest"].is_object());
    }
}
