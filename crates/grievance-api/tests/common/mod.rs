//! Shared helpers for API integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use grievance_api::config::AppConfig;
use grievance_api::{build_router, AppState};
use grievance_core::HouseholdLocation;
use grievance_db::{InMemoryGrievanceRepository, StaticHouseholdDirectory};

pub const SYNC_TOKEN: &str = "sync-secret";

/// In-memory state with one known household `HH-1`.
pub fn memory_state(config: AppConfig) -> AppState {
    let mut households = HashMap::new();
    households.insert(
        "HH-1".to_string(),
        HouseholdLocation {
            island: "Upolu".to_string(),
            district: "Vaimauga".to_string(),
            village: "Apia".to_string(),
        },
    );
    AppState::new(
        config,
        Arc::new(InMemoryGrievanceRepository::new()),
        Arc::new(StaticHouseholdDirectory::new(households)),
    )
}

pub fn test_router() -> (Router, AppState) {
    let state = memory_state(AppConfig::for_memory());
    (build_router(state.clone()), state)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("router is infallible")
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Attach the peer address the server would see from the socket.
pub fn from_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Create a grievance and return its JSON representation.
pub async fn create(app: &Router, body: Value) -> Value {
    let response = send(app, json_request("POST", "/grievances", &body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}
