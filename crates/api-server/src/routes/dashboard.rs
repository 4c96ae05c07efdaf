//! Dashboard and UI state endpoints

use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};

use tasknest_core::task::today;
use tasknest_core::view::{Dashboard, UiState};

use crate::error::RouteError;
use crate::routes::auth::authorize;
use crate::state::AppState;

/// GET /api/dashboard - Everything the dashboard page renders
async fn get_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Dashboard>, RouteError> {
    let (session, user) = authorize(&state, &headers).await?;
    let snapshot = user.store().snapshot().await;
    let ui = user.ui().await;
    Ok(Json(Dashboard::new(
        Some(&session.identity),
        &snapshot,
        &ui,
        today(),
    )))
}

/// GET /api/ui
async fn get_ui(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UiState>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    Ok(Json(user.ui().await))
}

/// PUT /api/ui - View mode, open modal and theme
async fn put_ui(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(ui): Json<UiState>,
) -> Result<Json<UiState>, RouteError> {
    let (_, user) = authorize(&state, &headers).await?;
    Ok(Json(user.set_ui(ui).await))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/ui", get(get_ui).put(put_ui))
}
