//! Route handlers.
//!
//! - `/api/refresh-token`: the scheduler's entry point (GET or POST)
//! - `/v1/status`: unauthenticated health check

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::SharedState;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/refresh-token", get(refresh_token).post(refresh_token))
        .route("/v1/status", get(status))
        .with_state(state)
}

async fn status(State(state): State<SharedState>) -> impl IntoResponse {
    let config = &state.config;
    Json(json!({
        "status": "ok",
        "service": "ig-token-refresh",
        "version": env!("CARGO_PKG_VERSION"),
        "refresh_threshold_days": config.refresh_threshold_days,
        "alerts_enabled": config.alert.is_some(),
    }))
}

/// GET|POST /api/refresh-token — Check the stored token and refresh it if it is close to expiry.
async fn refresh_token(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    state.job.handle(&headers).await
}
