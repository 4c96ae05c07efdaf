//! Filter criteria endpoints

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use tasknest_core::store::FilterCriteria;

use crate::error::RouteError;
use crate::routes::auth::authorize;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ToggleTagRequest {
    pub tag: String,
}

/// GET /api/criteria
async fn get_criteria(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<FilterCriteria>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    Ok(Json(user.store().criteria().await))
}

/// PUT /api/criteria - Replace the criteria wholesale
async fn put_criteria(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(criteria): Json<FilterCriteria>,
) -> Result<Json<FilterCriteria>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    user.store().set_criteria(criteria).await;
    Ok(Json(user.store().criteria().await))
}

/// DELETE /api/criteria - Back to the defaults
async fn reset_criteria(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<FilterCriteria>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    user.store().reset_criteria().await;
    Ok(Json(user.store().criteria().await))
}

/// POST /api/criteria/tag - Select or clear a tag from the sidebar
async fn toggle_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ToggleTagRequest>,
) -> Result<Json<FilterCriteria>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    Ok(Json(user.store().toggle_tag(req.tag.trim()).await))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/criteria",
            get(get_criteria).put(put_criteria).delete(reset_criteria),
        )
        .route("/api/criteria/tag", post(toggle_tag))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::routes::testing::{app, build_state, read_json, register_user, request};

    #[tokio::test]
    async fn toggle_and_reset() {
        let (state, _tmp) = build_state().await;
        let app = app(state);
        let token = register_user(&app, "a@example.com").await;

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                "/api/criteria",
                Some(&token),
                Some(json!({ "filter": "completed", "priority": "High" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["filter"], "completed");

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/criteria/tag",
                Some(&token),
                Some(json!({ "tag": "work" })),
            ))
            .await
            .unwrap();
        let criteria = read_json(response).await;
        assert_eq!(criteria["tag"], "work");
        assert_eq!(criteria["filter"], "all");
        assert_eq!(criteria["priority"], "High");

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/criteria/tag",
                Some(&token),
                Some(json!({ "tag": "work" })),
            ))
            .await
            .unwrap();
        assert!(read_json(response).await["tag"].is_null());

        let response = app
            .oneshot(request("DELETE", "/api/criteria", Some(&token), None))
            .await
            .unwrap();
        let criteria = read_json(response).await;
        assert_eq!(criteria["filter"], "all");
        assert!(criteria["priority"].is_null());
    }

    #[tokio::test]
    async fn blank_tag_leaves_criteria_alone() {
        let (state, _tmp) = build_state().await;
        let app = app(state);
        let token = register_user(&app, "a@example.com").await;

        app.clone()
            .oneshot(request(
                "PUT",
                "/api/criteria",
                Some(&token),
                Some(json!({ "filter": "trash" })),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(request(
                "POST",
                "/api/criteria/tag",
                Some(&token),
                Some(json!({ "tag": "  " })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let criteria = read_json(response).await;
        assert!(criteria["tag"].is_null());
        assert_eq!(criteria["filter"], "trash");
    }

    #[tokio::test]
    async fn unknown_filter_is_rejected() {
        let (state, _tmp) = build_state().await;
        let app = app(state);
        let token = register_user(&app, "a@example.com").await;

        let response = app
            .oneshot(request(
                "PUT",
                "/api/criteria",
                Some(&token),
                Some(json!({ "filter": "someday" })),
            ))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
