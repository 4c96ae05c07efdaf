//! Route handlers

pub mod auth;
pub mod criteria;
pub mod dashboard;
pub mod health;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(task::router())
        .merge(criteria::router())
        .merge(dashboard::router())
}
