//! HTTP surface for ig-token-refresh.

pub mod routes;

use crate::SharedState;
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn router(state: SharedState) -> Router {
    routes::router(state).layer(TraceLayer::new_for_http())
}
