// src/api/http.rs
// Webhook endpoint and health check

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::error::{ApiError, ApiResult};
use crate::bot::InboundMessage;
use crate::intake::prompts::Reply;
use crate::state::AppState;

/// Header carrying the webhook secret
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotResponse {
    pub replies: Vec<Reply>,
}

pub fn http_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/bot", post(webhook_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn check_secret(expected: Option<&str>, headers: &HeaderMap) -> ApiResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if provided == Some(expected) {
        Ok(())
    } else {
        warn!("Rejected webhook call with missing or wrong secret");
        Err(ApiError::unauthorized("Invalid webhook secret"))
    }
}

pub async fn webhook_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<InboundMessage>, JsonRejection>,
) -> ApiResult<Json<BotResponse>> {
    check_secret(app_state.webhook_secret.as_deref(), &headers)?;

    let Json(message) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if message.chat_id.trim().is_empty() {
        return Err(ApiError::bad_request("Missing chat_id"));
    }

    let replies = app_state.bot.handle(&message).await;
    Ok(Json(BotResponse { replies }))
}
