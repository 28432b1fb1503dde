// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for introspection and chat forwarding.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorResponse, GateError};
use crate::state::{epoch_ms, GateState};
use crate::transport::ENDPOINTS;
use crate::upstream::catalog;
use crate::upstream::request::{ChatOptions, ChatTurn};

pub const SERVICE_NAME: &str = "sessiongate";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: u64,
    pub version: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub initialized: bool,
    pub state: crate::credential::manager::Lifecycle,
    pub api_key_loaded: bool,
    pub cookies_loaded: bool,
    pub cookie_count: usize,
    pub available_models: &'static [&'static str],
    pub available_tools: &'static [&'static str],
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub models: &'static [&'static str],
    pub tools: &'static [&'static str],
    pub chat_styles: &'static [&'static str],
    pub features: &'static [&'static str],
    pub version: &'static str,
    pub timestamp: u64,
}

/// Body of `POST /chat`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub chat_history: Option<Vec<ChatTurn>>,
    #[serde(default)]
    pub options: Option<ChatOptions>,
}

/// Body of `POST /message`.
#[derive(Debug, Default, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub options: Option<ChatOptions>,
}

/// Body of `POST /continue`.
#[derive(Debug, Default, Deserialize)]
pub struct ContinueRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<ChatTurn>>,
    #[serde(default)]
    pub options: Option<ChatOptions>,
}

#[derive(Debug, Serialize)]
pub struct ForwardResponse {
    pub success: bool,
    pub response: serde_json::Value,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundResponse {
    #[serde(flatten)]
    pub error: ErrorResponse,
    pub available_endpoints: &'static [&'static str],
}

// -- Usage hints --------------------------------------------------------------

fn options_usage() -> serde_json::Value {
    serde_json::json!({
        "model": "string (optional, default \"standard\")",
        "chatStyle": "string (optional, default \"chat\")",
        "enabledTools": "string[] (optional, default [])",
    })
}

fn chat_usage() -> serde_json::Value {
    serde_json::json!({
        "message": "string (required)",
        "chatHistory": "[{ role: \"user\" | \"assistant\", content: string }] (optional)",
        "options": options_usage(),
    })
}

fn message_usage() -> serde_json::Value {
    serde_json::json!({
        "message": "string (required)",
        "options": options_usage(),
    })
}

fn continue_usage() -> serde_json::Value {
    serde_json::json!({
        "message": "string (required)",
        "history": "[{ role: \"user\" | \"assistant\", content: string }] (required)",
        "options": options_usage(),
    })
}

fn bad_request(message: impl Into<String>, usage: serde_json::Value) -> Response {
    GateError::BadRequest.response(message).with_usage(usage).into_response()
}

/// Take a non-blank message or `None`.
fn required_message(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}

// -- Handlers -----------------------------------------------------------------

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        timestamp: epoch_ms(),
        version: VERSION,
        service: SERVICE_NAME,
    })
}

/// `GET /status` — credential state and catalog.
pub async fn status(State(s): State<Arc<GateState>>) -> impl IntoResponse {
    let summary = s.credentials.summary().await;
    Json(StatusResponse {
        initialized: summary.initialized,
        state: summary.lifecycle,
        api_key_loaded: summary.api_key_loaded,
        cookies_loaded: summary.cookie_count > 0,
        cookie_count: summary.cookie_count,
        available_models: catalog::MODELS,
        available_tools: catalog::TOOLS,
        timestamp: epoch_ms(),
    })
}

/// `GET /info`
pub async fn info() -> impl IntoResponse {
    Json(InfoResponse {
        models: catalog::MODELS,
        tools: catalog::TOOLS,
        chat_styles: catalog::CHAT_STYLES,
        features: catalog::FEATURES,
        version: VERSION,
        timestamp: epoch_ms(),
    })
}

/// `POST /chat` — message with optional prior history.
pub async fn chat(
    State(s): State<Arc<GateState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => return bad_request(format!("invalid request body: {}", e.body_text()), chat_usage()),
    };
    let Some(message) = required_message(req.message) else {
        return bad_request("message is required", chat_usage());
    };
    let history = req.chat_history.unwrap_or_default();
    forward(&s, &message, &history, &req.options.unwrap_or_default()).await
}

/// `POST /message` — single message, no history.
pub async fn message(
    State(s): State<Arc<GateState>>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => {
            return bad_request(format!("invalid request body: {}", e.body_text()), message_usage())
        }
    };
    let Some(message) = required_message(req.message) else {
        return bad_request("message is required", message_usage());
    };
    forward(&s, &message, &[], &req.options.unwrap_or_default()).await
}

/// `POST /continue` — message appended to a caller-held conversation.
pub async fn continue_chat(
    State(s): State<Arc<GateState>>,
    payload: Result<Json<ContinueRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => {
            return bad_request(format!("invalid request body: {}", e.body_text()), continue_usage())
        }
    };
    let (Some(message), Some(history)) = (required_message(req.message), req.history) else {
        return bad_request("message and history are required", continue_usage());
    };
    forward(&s, &message, &history, &req.options.unwrap_or_default()).await
}

/// Fallback for unknown routes.
pub async fn not_found(method: Method, uri: Uri) -> Response {
    let (status, Json(error)) =
        GateError::NotFound.response(format!("no route for {method} {}", uri.path())).into_parts();
    (status, Json(NotFoundResponse { error, available_endpoints: ENDPOINTS })).into_response()
}

/// Make sure credentials exist, then relay one chat request upstream.
async fn forward(
    s: &Arc<GateState>,
    message: &str,
    history: &[ChatTurn],
    options: &ChatOptions,
) -> Response {
    if let Err(e) = s.credentials.ensure_ready().await {
        tracing::warn!(err = %e, "credentials unavailable for forward");
        return ErrorResponse::from(&e).into_response();
    }
    let creds = s.credentials.snapshot().await;

    match s.forwarder.send(&creds, message, history, options).await {
        Ok(response) => {
            Json(ForwardResponse { success: true, response, timestamp: epoch_ms() }).into_response()
        }
        Err(e) => {
            if e.is_auth() {
                tracing::warn!(err = %e, "upstream rejected session credentials");
            } else {
                tracing::warn!(err = %e, "upstream request failed");
            }
            ErrorResponse::from(&e).into_response()
        }
    }
}
