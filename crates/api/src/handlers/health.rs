//! Health check endpoint for load balancers and monitoring.
//!
//! Returns 200 OK with the current store sizes if the stores answer,
//! 503 Service Unavailable otherwise.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    tokens: usize,
    codes: usize,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.credentials.sizes().await {
        Ok(sizes) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                tokens: sizes.tokens,
                codes: sizes.codes,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    tokens: 0,
                    codes: 0,
                }),
            )
        }
    }
}
