// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the gateway.

pub mod http;
pub mod http_cred;

use std::any::Any;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::GateError;
use crate::state::GateState;

/// Routes served by the gateway, advertised on 404.
pub const ENDPOINTS: &[&str] = &[
    "GET /health",
    "GET /status",
    "GET /info",
    "POST /chat",
    "POST /message",
    "POST /continue",
    "POST /refresh-cookies",
];

/// Build the axum `Router` with all gateway routes.
pub fn build_router(state: Arc<GateState>) -> Router {
    let routes = Router::new()
        // Introspection
        .route("/health", get(http::health))
        .route("/status", get(http::status))
        .route("/info", get(http::info))
        // Forwarding
        .route("/chat", post(http::chat))
        .route("/message", post(http::message))
        .route("/continue", post(http::continue_chat))
        // Credential management
        .route("/refresh-cookies", post(http_cred::refresh_cookies))
        .fallback(http::not_found)
        .with_state(state);
    with_middleware(routes)
}

/// Tracing, permissive CORS, and panic-to-500 conversion.
pub fn with_middleware(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(CatchPanicLayer::custom(handle_panic)),
    )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic".to_owned()
    };
    tracing::error!(panic = %detail, "handler panicked");
    GateError::Internal.response("internal server error").into_response()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
