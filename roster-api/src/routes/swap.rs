//! Swap Request REST API Routes
//!
//! Every handler resolves the caller from the identity header and delegates
//! to [`roster_exchange::SwapService`]; role checks, visibility and state
//! legality live there.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use roster_core::{DateRange, SwapDraft, SwapFilter, SwapId};

use crate::{
    error::ApiResult,
    middleware::Caller,
    state::AppState,
    types::{
        DateRangeParams, DecisionRequest, ListSwapsParams, ListSwapsResponse, RespondRequest,
        SwapHistoryResponse,
    },
};

#[cfg(feature = "openapi")]
use crate::error::ApiError;
#[cfg(feature = "openapi")]
use roster_core::{SwapRequest, SwapStatistics};

// ============================================================================
// TRANSITIONS
// ============================================================================

/// POST /api/v1/swaps - Propose an exchange to another agent
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/swaps",
    tag = "Swaps",
    request_body = SwapDraft,
    params(("x-roster-agent-id" = String, Header, description = "Authenticated agent")),
    responses(
        (status = 201, description = "Swap request created", body = SwapRequest),
        (status = 400, description = "Invalid proposal or duplicate active request", body = ApiError),
        (status = 401, description = "Missing caller identity", body = ApiError),
    ),
))]
pub async fn create_swap(
    State(state): State<AppState>,
    caller: Caller,
    Json(draft): Json<SwapDraft>,
) -> ApiResult<impl IntoResponse> {
    let request = state.service.create_swap(caller.agent_id(), draft).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// POST /api/v1/swaps/{id}/respond - Recipient accepts or refuses
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/swaps/{id}/respond",
    tag = "Swaps",
    request_body = RespondRequest,
    params(
        ("id" = String, Path, description = "Swap request ID"),
        ("x-roster-agent-id" = String, Header, description = "Authenticated agent"),
    ),
    responses(
        (status = 200, description = "Response recorded", body = SwapRequest),
        (status = 404, description = "Not found or not addressed to the caller", body = ApiError),
        (status = 409, description = "Request is no longer pending", body = ApiError),
    ),
))]
pub async fn respond(
    State(state): State<AppState>,
    caller: Caller,
    Path(swap_id): Path<SwapId>,
    Json(body): Json<RespondRequest>,
) -> ApiResult<impl IntoResponse> {
    let request = state
        .service
        .agent_respond(caller.agent_id(), swap_id, body.action, body.comment)
        .await?;
    Ok(Json(request))
}

/// POST /api/v1/swaps/{id}/decision - Supervisor validates or refuses
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/swaps/{id}/decision",
    tag = "Swaps",
    request_body = DecisionRequest,
    params(
        ("id" = String, Path, description = "Swap request ID"),
        ("x-roster-agent-id" = String, Header, description = "Authenticated supervisor"),
    ),
    responses(
        (status = 200, description = "Decision recorded; validation exchanged the shifts", body = SwapRequest),
        (status = 403, description = "Caller is not a supervisor", body = ApiError),
        (status = 404, description = "Swap request not found", body = ApiError),
        (status = 409, description = "Not awaiting a decision, or shifts changed owner", body = ApiError),
    ),
))]
pub async fn decide(
    State(state): State<AppState>,
    caller: Caller,
    Path(swap_id): Path<SwapId>,
    Json(body): Json<DecisionRequest>,
) -> ApiResult<impl IntoResponse> {
    let request = state
        .service
        .supervisor_decide(caller.agent_id(), swap_id, body.action, body.comment)
        .await?;
    Ok(Json(request))
}

/// POST /api/v1/swaps/{id}/cancel - Withdraw a request
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/swaps/{id}/cancel",
    tag = "Swaps",
    params(
        ("id" = String, Path, description = "Swap request ID"),
        ("x-roster-agent-id" = String, Header, description = "Requester or admin"),
    ),
    responses(
        (status = 200, description = "Request cancelled", body = SwapRequest),
        (status = 403, description = "Caller is neither requester nor admin", body = ApiError),
        (status = 404, description = "Swap request not found", body = ApiError),
        (status = 409, description = "Request already closed", body = ApiError),
    ),
))]
pub async fn cancel(
    State(state): State<AppState>,
    caller: Caller,
    Path(swap_id): Path<SwapId>,
) -> ApiResult<impl IntoResponse> {
    let request = state.service.cancel_swap(caller.agent_id(), swap_id).await?;
    Ok(Json(request))
}

// ============================================================================
// QUERIES
// ============================================================================

/// GET /api/v1/swaps - Requests visible to the caller, newest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/swaps",
    tag = "Swaps",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("involvement" = Option<String>, Query, description = "any, sent or received"),
        ("x-roster-agent-id" = String, Header, description = "Authenticated agent"),
    ),
    responses(
        (status = 200, description = "Visible swap requests", body = ListSwapsResponse),
    ),
))]
pub async fn list_swaps(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<ListSwapsParams>,
) -> ApiResult<impl IntoResponse> {
    let swaps = state
        .service
        .list_swaps(caller.agent_id(), SwapFilter::from(params))
        .await?;
    Ok(Json(ListSwapsResponse::from(swaps)))
}

/// GET /api/v1/swaps/actionable - Requests waiting on the caller
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/swaps/actionable",
    tag = "Swaps",
    params(("x-roster-agent-id" = String, Header, description = "Authenticated agent")),
    responses(
        (status = 200, description = "Requests to process", body = ListSwapsResponse),
    ),
))]
pub async fn list_actionable(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let swaps = state.service.list_actionable(caller.agent_id()).await?;
    Ok(Json(ListSwapsResponse::from(swaps)))
}

/// GET /api/v1/swaps/statistics - Counts over the caller's visible requests
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/swaps/statistics",
    tag = "Swaps",
    params(
        ("from" = Option<String>, Query, description = "First creation day (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Last creation day (YYYY-MM-DD)"),
        ("x-roster-agent-id" = String, Header, description = "Authenticated agent"),
    ),
    responses(
        (status = 200, description = "Statistics for the period", body = SwapStatistics),
        (status = 400, description = "Range ends before it starts", body = ApiError),
    ),
))]
pub async fn statistics(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<DateRangeParams>,
) -> ApiResult<impl IntoResponse> {
    let stats = state
        .service
        .get_statistics(caller.agent_id(), DateRange::from(params))
        .await?;
    Ok(Json(stats))
}

/// GET /api/v1/swaps/{id} - One visible request
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/swaps/{id}",
    tag = "Swaps",
    params(
        ("id" = String, Path, description = "Swap request ID"),
        ("x-roster-agent-id" = String, Header, description = "Authenticated agent"),
    ),
    responses(
        (status = 200, description = "Swap request", body = SwapRequest),
        (status = 404, description = "Not found or not visible", body = ApiError),
    ),
))]
pub async fn get_swap(
    State(state): State<AppState>,
    caller: Caller,
    Path(swap_id): Path<SwapId>,
) -> ApiResult<impl IntoResponse> {
    let request = state.service.get_swap(caller.agent_id(), swap_id).await?;
    Ok(Json(request))
}

/// GET /api/v1/swaps/{id}/history - Audit trail, newest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/swaps/{id}/history",
    tag = "Swaps",
    params(
        ("id" = String, Path, description = "Swap request ID"),
        ("x-roster-agent-id" = String, Header, description = "Authenticated agent"),
    ),
    responses(
        (status = 200, description = "Audit entries", body = SwapHistoryResponse),
        (status = 404, description = "Not found or not visible", body = ApiError),
    ),
))]
pub async fn history(
    State(state): State<AppState>,
    caller: Caller,
    Path(swap_id): Path<SwapId>,
) -> ApiResult<impl IntoResponse> {
    let entries = state.service.swap_history(caller.agent_id(), swap_id).await?;
    Ok(Json(SwapHistoryResponse { entries }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_swap).get(list_swaps))
        .route("/actionable", get(list_actionable))
        .route("/statistics", get(statistics))
        .route("/:id", get(get_swap))
        .route("/:id/history", get(history))
        .route("/:id/respond", post(respond))
        .route("/:id/decision", post(decide))
        .route("/:id/cancel", post(cancel))
}
