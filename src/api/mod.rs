//! Inbound HTTP surface
//!
//! Axum router exposing the panel webhook, a health probe and the
//! diagnostic endpoints. All handlers share the application context; every
//! response body is structured JSON.

pub mod webhook;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::services::AppContext;

/// Create the complete API router with all endpoints and middleware
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhook", post(webhook::receive_webhook))
        .route("/webhook/test", get(webhook::webhook_test))
        .route("/webhook/simulate", post(webhook::simulate_webhook))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Health check endpoint
async fn health_check(State(_ctx): State<AppContext>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
