//! Directory and schedule reads backing the swap proposal form.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use roster_core::{AgentId, DateRange};

use crate::{
    error::ApiResult,
    middleware::Caller,
    state::AppState,
    types::{DateRangeParams, ListAgentsParams, ListAgentsResponse, ListShiftsResponse},
};

#[cfg(feature = "openapi")]
use crate::error::ApiError;

/// GET /api/v1/agents - Active accounts, sorted by name
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "Directory",
    params(
        ("role" = Option<String>, Query, description = "admin, supervisor or agent"),
        ("x-roster-agent-id" = String, Header, description = "Authenticated agent"),
    ),
    responses(
        (status = 200, description = "Active accounts", body = ListAgentsResponse),
    ),
))]
pub async fn list_agents(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<ListAgentsParams>,
) -> ApiResult<impl IntoResponse> {
    let agents = state
        .service
        .list_active_agents(caller.agent_id(), params.role)
        .await?;
    let total = agents.len();
    Ok(Json(ListAgentsResponse { agents, total }))
}

/// GET /api/v1/agents/{id}/shifts - Schedule of one agent, oldest day first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/agents/{id}/shifts",
    tag = "Directory",
    params(
        ("id" = String, Path, description = "Agent ID"),
        ("from" = Option<String>, Query, description = "First day (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Last day (YYYY-MM-DD)"),
        ("x-roster-agent-id" = String, Header, description = "Authenticated agent"),
    ),
    responses(
        (status = 200, description = "Shift records", body = ListShiftsResponse),
        (status = 400, description = "Range ends before it starts", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
    ),
))]
pub async fn list_agent_shifts(
    State(state): State<AppState>,
    caller: Caller,
    Path(agent_id): Path<AgentId>,
    Query(params): Query<DateRangeParams>,
) -> ApiResult<impl IntoResponse> {
    let shifts = state
        .service
        .list_agent_shifts(caller.agent_id(), agent_id, DateRange::from(params))
        .await?;
    let total = shifts.len();
    Ok(Json(ListShiftsResponse { shifts, total }))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_agents))
        .route("/:id/shifts", get(list_agent_shifts))
}
