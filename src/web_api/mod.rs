//! WebAPI - HTTP Endpoints
//!
//! ## Responsibilities
//!
//! - Ingestion, state query and SSE streaming routes
//! - Request validation and response framing

mod routes;

pub use routes::create_router;

use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "time": Utc::now()
    }))
}
