//! Route modules and the assembled application router.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod navigation;

/// Every route the server exposes, before state and middleware are applied.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/navigation", navigation::router())
}
