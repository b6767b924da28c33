//! External status push: bearer token and source-address gate.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};

use common::*;
use grievance_api::build_router;
use grievance_api::config::AppConfig;
use grievance_api::middleware::AllowedNetwork;

fn sync_router(allowed: &str) -> Router {
    let mut config = AppConfig::for_memory();
    config.sync_token = Some(SYNC_TOKEN.to_string());
    config.sync_allowed_ips = AllowedNetwork::parse_list(allowed).unwrap();
    build_router(memory_state(config))
}

fn sync_request(id: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("PUT")
        .uri(format!("/sync/{}/status", id))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_sync_updates_status() {
    let app = sync_router("");
    let created = create(&app, json!({"details": "Pending case"})).await;
    let id = created["id"].as_str().unwrap();

    let response = send(
        &app,
        sync_request(
            id,
            Some(SYNC_TOKEN),
            &json!({"status": "Resolved", "note": "Paid", "updated_at": "2026-03-01T00:00:00Z"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"ok": true, "id": id, "status": "Resolved"})
    );

    let stored = body_json(send(&app, get(&format!("/grievances/{}", id))).await).await;
    assert_eq!(stored["external_status"], "Resolved");
    assert_eq!(stored["external_status_note"], "Paid");
    assert_eq!(stored["external_updated_at"], "2026-03-01T00:00:00Z");
}

#[tokio::test]
async fn test_sync_accepts_aliases_and_defaults_timestamp() {
    let app = sync_router("");
    let created = create(&app, json!({"details": "Alias case"})).await;
    let id = created["id"].as_str().unwrap();

    let response = send(
        &app,
        sync_request(
            id,
            Some(SYNC_TOKEN),
            &json!({"external_status": "Closed", "external_updated_at": "not a date"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = body_json(send(&app, get(&format!("/grievances/{}", id))).await).await;
    assert_eq!(stored["external_status"], "Closed");
    assert!(stored["external_updated_at"].is_string());
    assert!(stored["external_status_note"].is_null());
}

#[tokio::test]
async fn test_sync_tolerates_non_string_timestamps() {
    let app = sync_router("");
    let created = create(&app, json!({"details": "Epoch case"})).await;
    let id = created["id"].as_str().unwrap();

    let response = send(
        &app,
        sync_request(id, Some(SYNC_TOKEN), &json!({"status": "resolved", "updated_at": 1705314600})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let stored = body_json(send(&app, get(&format!("/grievances/{}", id))).await).await;
    assert_eq!(stored["external_updated_at"], "2024-01-15T10:30:00Z");

    let response = send(
        &app,
        sync_request(id, Some(SYNC_TOKEN), &json!({"status": "closed", "updated_at": true})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let stored = body_json(send(&app, get(&format!("/grievances/{}", id))).await).await;
    assert_eq!(stored["external_status"], "closed");
    assert_ne!(stored["external_updated_at"], "2024-01-15T10:30:00Z");
}

#[tokio::test]
async fn test_sync_blank_status_is_stored() {
    let app = sync_router("");
    let created = create(&app, json!({"details": "Blank status"})).await;
    let id = created["id"].as_str().unwrap();

    let response = send(&app, sync_request(id, Some(SYNC_TOKEN), &json!({"status": ""}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"ok": true, "id": id, "status": ""})
    );
}

#[tokio::test]
async fn test_sync_token_checks() {
    let app = sync_router("");
    let created = create(&app, json!({"details": "Token case"})).await;
    let id = created["id"].as_str().unwrap();
    let body = json!({"status": "Resolved"});

    let response = send(&app, sync_request(id, None, &body)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Missing Bearer token");

    let response = send(&app, sync_request(id, Some("wrong"), &body)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Invalid token");

    let stored = body_json(send(&app, get(&format!("/grievances/{}", id))).await).await;
    assert!(stored["external_status"].is_null());
}

#[tokio::test]
async fn test_sync_unknown_id_is_404() {
    let app = sync_router("");
    let response = send(
        &app,
        sync_request("no-such-id", Some(SYNC_TOKEN), &json!({"status": "Resolved"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Grievance not found");
}

#[tokio::test]
async fn test_sync_address_allow_list() {
    let app = sync_router("10.0.0.0/8, 192.168.1.5");
    let created = create(&app, json!({"details": "IP case"})).await;
    let id = created["id"].as_str().unwrap();
    let body = json!({"status": "Resolved"});

    let response = send(
        &app,
        from_peer(sync_request(id, Some(SYNC_TOKEN), &body), "203.0.113.9:4000"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "IP not allowed");

    // No peer information at all is treated as not allowed.
    let response = send(&app, sync_request(id, Some(SYNC_TOKEN), &body)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        from_peer(sync_request(id, Some(SYNC_TOKEN), &body), "10.20.30.40:4000"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        from_peer(sync_request(id, Some(SYNC_TOKEN), &body), "192.168.1.5:4000"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sync_unconfigured_is_503() {
    let (app, state) = test_router();
    let response = send(
        &app,
        sync_request(&state.ids.new_id(), Some("anything"), &json!({"status": "x"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
