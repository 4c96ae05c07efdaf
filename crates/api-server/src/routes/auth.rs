//! Sign-up, sign-in and session endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use tasknest_core::identity::{Credentials, Identity, Registration, Session};

use crate::error::{core_error, unauthorized, RouteError};
use crate::sessions::UserSession;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: String,
    expires_at: String,
    user: Identity,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            expires_at: session.expires_at.to_rfc3339(),
            user: session.identity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    user: Identity,
    expires_at: String,
    loading: bool,
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, RouteError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header"))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized("Authorization must be Bearer token"))
}

/// Resolve the caller's session from the bearer token
pub(crate) async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(Session, Arc<UserSession>), RouteError> {
    let token = bearer_token(headers)?;
    state.sessions().resolve(token).await.map_err(core_error)
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<Registration>,
) -> Result<(StatusCode, Json<AuthResponse>), RouteError> {
    let (session, _) = state.sessions().sign_up(&req).await.map_err(core_error)?;
    Ok((StatusCode::CREATED, Json(AuthResponse::from(session))))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<Json<AuthResponse>, RouteError> {
    let (session, _) = state.sessions().sign_in(&req).await.map_err(core_error)?;
    Ok(Json(AuthResponse::from(session)))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, RouteError> {
    let token = bearer_token(&headers)?;
    state.sessions().sign_out(token).await.map_err(core_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, RouteError> {
    let (session, user) = authorize(&state, &headers).await?;
    Ok(Json(MeResponse {
        user: session.identity,
        expires_at: session.expires_at.to_rfc3339(),
        loading: user.identity().is_loading() || user.store().is_loading(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}
