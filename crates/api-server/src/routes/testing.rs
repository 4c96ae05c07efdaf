//! Shared fixtures for route tests

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use tasknest_core::identity::DirectorySettings;

use crate::state::AppState;

pub async fn build_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let state = AppState::new(temp_dir.path().to_path_buf(), DirectorySettings::default())
        .await
        .unwrap();
    (state, temp_dir)
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Register `email` with password `dev-password` and return its token
pub async fn register_user(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": "dev-password" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Every API router, as served
pub fn app(state: AppState) -> Router {
    crate::routes::router().with_state(state)
}
