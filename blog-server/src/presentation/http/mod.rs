use axum::{
    Json, Router,
    extract::{OriginalUri, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::AppState;

pub(crate) mod app_error;
pub(crate) mod handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;


pub(crate) fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .merge(routes::router(state.clone()))
        .fallback(endpoint_not_found)
        .with_state(state)
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    environment: String,
}

#[derive(Debug, Serialize)]
struct NotFoundBody {
    message: &'static str,
    path: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
        environment: state.environment.to_string(),
    })
}

async fn endpoint_not_found(OriginalUri(uri): OriginalUri) -> (StatusCode, Json<NotFoundBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundBody {
            message: "API endpoint not found",
            path: uri.to_string(),
        }),
    )
}
