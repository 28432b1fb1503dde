// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handler for manual credential refresh.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::credential::acquire::AcquireOptions;
use crate::error::GateError;
use crate::state::{epoch_ms, GateState};

/// Request body for `POST /refresh-cookies`. Every field is optional and
/// falls back to the configured acquisition defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub headless: Option<bool>,
    #[serde(default)]
    pub wait_time_ms: Option<u64>,
    #[serde(default)]
    pub auto_extract: Option<bool>,
}

impl RefreshRequest {
    pub fn apply(&self, defaults: AcquireOptions) -> AcquireOptions {
        AcquireOptions {
            headless: self.headless.unwrap_or(defaults.headless),
            wait_time: self.wait_time_ms.map(Duration::from_millis).unwrap_or(defaults.wait_time),
            auto_extract: self.auto_extract.unwrap_or(defaults.auto_extract),
            navigation_timeout: defaults.navigation_timeout,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    pub cookie_count: usize,
    pub api_key_found: bool,
    pub timestamp: u64,
}

/// `POST /refresh-cookies` — run a browser acquisition and replace the
/// stored credentials. Concurrent calls share one browser run.
pub async fn refresh_cookies(
    State(s): State<Arc<GateState>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        // An empty POST is a refresh with defaults.
        Err(JsonRejection::MissingJsonContentType(_)) => RefreshRequest::default(),
        Err(e) => {
            return GateError::BadRequest
                .response(format!("invalid request body: {}", e.body_text()))
                .with_usage(serde_json::json!({
                    "headless": "boolean (optional)",
                    "waitTimeMs": "number (optional)",
                    "autoExtract": "boolean (optional)",
                }))
                .into_response();
        }
    };

    let options = req.apply(s.credentials.settings().defaults);
    tracing::info!(
        headless = options.headless,
        wait_ms = options.wait_time.as_millis() as u64,
        auto_extract = options.auto_extract,
        "manual credential refresh requested"
    );

    match s.credentials.refresh(options).await {
        Ok(summary) => Json(RefreshResponse {
            success: true,
            message: "session credentials refreshed".to_owned(),
            cookie_count: summary.cookie_count,
            api_key_found: summary.api_key_found,
            timestamp: epoch_ms(),
        })
        .into_response(),
        Err(e) => GateError::CredentialsUnavailable
            .response(format!("credential refresh failed: {e}"))
            .with_suggestion(
                "Previous credentials were kept. Retry with {\"headless\": false} to complete \
                 any verification challenge in a visible browser.",
            )
            .into_response(),
    }
}

#[cfg(test)]
#[path = "http_cred_tests.rs"]
mod tests;
