// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::credential::acquire::AcquisitionError;
use crate::state::epoch_ms;
use crate::upstream::client::ForwardError;

/// Remediation shown whenever the upstream rejects the session.
pub const REFRESH_SUGGESTION: &str = "Session credentials look stale. Run `sessiongate refresh` \
     or POST /refresh-cookies to acquire fresh cookies and API key, then retry.";

/// Error codes for the gateway API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateError {
    BadRequest,
    UpstreamAuth,
    NotFound,
    UpstreamError,
    CredentialsUnavailable,
    #[default]
    Internal,
}

impl GateError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::UpstreamAuth => 401,
            Self::NotFound => 404,
            Self::UpstreamError => 500,
            Self::CredentialsUnavailable => 500,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::UpstreamAuth => "UPSTREAM_AUTH",
            Self::NotFound => "NOT_FOUND",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::CredentialsUnavailable => "CREDENTIALS_UNAVAILABLE",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    /// Bare envelope for this code; extend with the `with_*` builders.
    pub fn response(&self, message: impl Into<String>) -> ErrorResponse {
        ErrorResponse {
            kind: *self,
            success: false,
            error: self.to_error_body(message),
            suggestion: None,
            usage: None,
            status: None,
            body: None,
            timestamp: epoch_ms(),
        }
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub kind: GateError,
    pub success: bool,
    pub error: ErrorBody,
    /// Operator remediation for credential failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Expected request shape for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
    /// Upstream HTTP status, when the upstream answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Upstream response body, when the upstream answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub timestamp: u64,
}

impl ErrorResponse {
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_usage(mut self, usage: serde_json::Value) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_upstream(mut self, status: u16, body: impl Into<String>) -> Self {
        self.status = Some(status);
        self.body = Some(body.into());
        self
    }

    pub fn into_parts(self) -> (StatusCode, Json<ErrorResponse>) {
        let status = StatusCode::from_u16(self.kind.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self))
    }
}

impl axum::response::IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        self.into_parts().into_response()
    }
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<&ForwardError> for ErrorResponse {
    fn from(err: &ForwardError) -> Self {
        match err {
            ForwardError::Auth { status, body } => GateError::UpstreamAuth
                .response(err.to_string())
                .with_suggestion(REFRESH_SUGGESTION)
                .with_upstream(*status, body.clone()),
            ForwardError::Upstream { status, body } => {
                GateError::UpstreamError.response(err.to_string()).with_upstream(*status, body.clone())
            }
            ForwardError::Transport(_) => GateError::UpstreamError.response(err.to_string()),
        }
    }
}

impl From<&AcquisitionError> for ErrorResponse {
    fn from(err: &AcquisitionError) -> Self {
        GateError::CredentialsUnavailable
            .response(format!("could not establish upstream session: {err}"))
            .with_suggestion(REFRESH_SUGGESTION)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
