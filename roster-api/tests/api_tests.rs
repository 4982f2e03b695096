//! HTTP-level tests of the ROSTER API against the in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use roster_api::{create_router, ApiConfig, AppState, StoreBackend, CALLER_HEADER};
use roster_test_utils::fixtures::{seeded_roster, SeededRoster};
use roster_test_utils::*;
use serde_json::{json, Value};
use tower::ServiceExt;

// ============================================================================
// HARNESS
// ============================================================================

fn app(roster: &SeededRoster) -> Router {
    let config = ApiConfig::default();
    let state = AppState::with_store(
        Arc::new(roster.store.clone()),
        config.policy.clone(),
        StoreBackend::Memory,
    );
    create_router(state, &config)
}

/// Send one request; the body is parsed as JSON when possible.
async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    caller: Option<AgentId>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(CALLER_HEADER, caller.to_string());
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

fn draft_body(roster: &SeededRoster, message: &str) -> Value {
    json!({
        "recipient_id": roster.bruno.agent_id,
        "requester_shift_id": roster.alice_shift.shift_id,
        "recipient_shift_id": roster.bruno_shift.shift_id,
        "message": message,
    })
}

async fn create(app: &Router, roster: &SeededRoster) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/swaps",
        Some(roster.alice.agent_id),
        Some(draft_body(roster, "family event")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["swap_id"].as_str().unwrap().to_string()
}

// ============================================================================
// HEALTH AND IDENTITY
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let roster = seeded_roster().await;
    let app = app(&roster);

    let (status, body) = send(&app, Method::GET, "/health/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("pong".to_string()));

    let (status, body) = send(&app, Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_missing_caller_is_unauthorized() {
    let roster = seeded_roster().await;
    let app = app(&roster);

    let (status, body) = send(&app, Method::GET, "/api/v1/swaps", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_caller_is_not_found() {
    let roster = seeded_roster().await;
    let app = app(&roster);

    let (status, body) =
        send(&app, Method::GET, "/api/v1/swaps", Some(AgentId::now_v7()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_swap_id_is_bad_request() {
    let roster = seeded_roster().await;
    let app = app(&roster);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/swaps/not-a-uuid",
        Some(roster.alice.agent_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// WORKFLOW
// ============================================================================

#[tokio::test]
async fn test_full_exchange_over_http() {
    let roster = seeded_roster().await;
    let app = app(&roster);
    let swap_id = create(&app, &roster).await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/swaps/actionable",
        Some(roster.bruno.agent_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["swaps"][0]["swap_id"], swap_id.as_str());

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/swaps/{swap_id}/respond"),
        Some(roster.bruno.agent_id),
        Some(json!({ "action": "accept", "comment": "fine by me" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "agent_accepted");
    assert_eq!(body["recipient_comment"], "fine by me");

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/swaps/actionable",
        Some(roster.supervisor.agent_id),
        None,
    )
    .await;
    assert_eq!(body["total"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/swaps/{swap_id}/decision"),
        Some(roster.supervisor.agent_id),
        Some(json!({ "action": "validate" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "supervisor_validated");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!(
            "/api/v1/agents/{}/shifts?from=2025-06-24&to=2025-06-24",
            roster.alice.agent_id
        ),
        Some(roster.alice.agent_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["shifts"][0]["service_type"], "nuit");
    assert_eq!(body["shifts"][0]["start_time"], "21:00:00");

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/agents/{}/shifts", roster.bruno.agent_id),
        Some(roster.bruno.agent_id),
        None,
    )
    .await;
    assert_eq!(body["shifts"][0]["service_type"], "matin");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/swaps/{swap_id}/history"),
        Some(roster.alice.agent_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["action"], "supervisor_validated");
    assert_eq!(entries[1]["action"], "agent_accepted");
}

#[tokio::test]
async fn test_refused_request_cannot_be_decided() {
    let roster = seeded_roster().await;
    let app = app(&roster);
    let swap_id = create(&app, &roster).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/swaps/{swap_id}/respond"),
        Some(roster.bruno.agent_id),
        Some(json!({ "action": "refuse", "comment": "unavailable" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "agent_refused");
    assert!(body["responded_at"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/swaps/{swap_id}/decision"),
        Some(roster.supervisor.agent_id),
        Some(json!({ "action": "validate" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");
    assert_eq!(body["details"]["status"], "agent_refused");

    assert_eq!(roster.shift(roster.alice_shift.shift_id).await, roster.alice_shift);
}

#[tokio::test]
async fn test_role_and_visibility_errors() {
    let roster = seeded_roster().await;
    let app = app(&roster);
    let swap_id = create(&app, &roster).await;

    // Only the recipient may answer; anyone else sees nothing.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/swaps/{swap_id}/respond"),
        Some(roster.chloe.agent_id),
        Some(json!({ "action": "accept" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/swaps/{swap_id}"),
        Some(roster.chloe.agent_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/swaps/{swap_id}/decision"),
        Some(roster.bruno.agent_id),
        Some(json!({ "action": "validate" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/swaps/{swap_id}"),
        Some(roster.supervisor.agent_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_duplicate_and_self_swaps_are_validation_errors() {
    let roster = seeded_roster().await;
    let app = app(&roster);
    create(&app, &roster).await;

    let reversed = json!({
        "recipient_id": roster.alice.agent_id,
        "requester_shift_id": roster.bruno_shift.shift_id,
        "recipient_shift_id": roster.alice_shift.shift_id,
    });
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/swaps",
        Some(roster.bruno.agent_id),
        Some(reversed),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let own = json!({
        "recipient_id": roster.alice.agent_id,
        "requester_shift_id": roster.alice_shift.shift_id,
        "recipient_shift_id": roster.bruno_shift.shift_id,
    });
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/swaps",
        Some(roster.alice.agent_id),
        Some(own),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(roster.store.swap_count().await, 1);
}

#[tokio::test]
async fn test_cancel_then_cancel_again() {
    let roster = seeded_roster().await;
    let app = app(&roster);
    let swap_id = create(&app, &roster).await;
    let uri = format!("/api/v1/swaps/{swap_id}/cancel");

    let (status, body) = send(&app, Method::POST, &uri, Some(roster.bruno.agent_id), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, body) = send(&app, Method::POST, &uri, Some(roster.alice.agent_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert!(body["cancelled_at"].is_string());

    let (status, body) = send(&app, Method::POST, &uri, Some(roster.alice.agent_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["status"], "cancelled");
}

// ============================================================================
// QUERIES
// ============================================================================

#[tokio::test]
async fn test_list_filters_by_involvement_and_status() {
    let roster = seeded_roster().await;
    let app = app(&roster);
    create(&app, &roster).await;

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/swaps?involvement=sent",
        Some(roster.bruno.agent_id),
        None,
    )
    .await;
    assert_eq!(body["total"], 0);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/swaps?involvement=received",
        Some(roster.bruno.agent_id),
        None,
    )
    .await;
    assert_eq!(body["total"], 1);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/swaps?status=agent_accepted",
        Some(roster.admin.agent_id),
        None,
    )
    .await;
    assert_eq!(body["total"], 0);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/swaps",
        Some(roster.chloe.agent_id),
        None,
    )
    .await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_statistics_over_http() {
    let roster = seeded_roster().await;
    let app = app(&roster);
    let swap_id = create(&app, &roster).await;
    send(
        &app,
        Method::POST,
        &format!("/api/v1/swaps/{swap_id}/respond"),
        Some(roster.bruno.agent_id),
        Some(json!({ "action": "refuse" })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/swaps/statistics",
        Some(roster.supervisor.agent_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["pending"], 0);
    assert_eq!(body["validated"], 0);
    assert_eq!(body["acceptance_rate"], 0.0);
    assert_eq!(body["by_status"]["agent_refused"], 1);
    assert_eq!(body["period"], "beginning to now");

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/swaps/statistics?from=2025-07-01&to=2025-06-01",
        Some(roster.supervisor.agent_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_directory_reads() {
    let roster = seeded_roster().await;
    let app = app(&roster);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/agents?role=supervisor",
        Some(roster.alice.agent_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["agents"][0]["username"], "sdurand");

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/agents",
        Some(roster.alice.agent_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/agents/{}/shifts", AgentId::now_v7()),
        Some(roster.alice.agent_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"]["entity_type"], "Agent");
}

#[cfg(feature = "openapi")]
#[tokio::test]
async fn test_openapi_document_is_served() {
    let roster = seeded_roster().await;
    let app = app(&roster);

    let (status, body) = send(&app, Method::GET, "/api/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/swaps/{id}/decision"].is_object());
}
