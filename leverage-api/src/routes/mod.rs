//! API route definitions

mod health;
mod risk;
mod trading;
pub mod ws;

use axum::{http::StatusCode, response::IntoResponse, Json, Router};

use crate::error::ErrorResponse;
use crate::AppState;

/// Create all HTTP routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(trading::routes())
        .merge(risk::routes())
}

/// Fallback for paths with no route
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found")))
}
