// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the upstream chat endpoint.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, Url};

use crate::credential::CredentialSet;
use crate::upstream::multipart;
use crate::upstream::request::{ChatOptions, ChatTurn, OutboundRequest};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Failure of one forwarded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardError {
    /// Upstream rejected the session (401, 403 or 429).
    Auth { status: u16, body: String },
    /// Any other non-2xx reply.
    Upstream { status: u16, body: String },
    /// The request never produced a response.
    Transport(String),
}

impl ForwardError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

impl fmt::Display for ForwardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth { status, .. } => {
                write!(f, "upstream rejected credentials ({status}); cookies or api key may be stale")
            }
            Self::Upstream { status, body } => write!(f, "upstream error ({status}): {body}"),
            Self::Transport(e) => write!(f, "upstream request failed: {e}"),
        }
    }
}

impl std::error::Error for ForwardError {}

/// Whether `status` means the session credentials were refused.
pub fn is_auth_status(status: u16) -> bool {
    matches!(status, 401 | 403 | 429)
}

/// Map a non-success upstream status to an error.
pub fn classify(status: u16, body: String) -> ForwardError {
    if is_auth_status(status) {
        ForwardError::Auth { status, body }
    } else {
        ForwardError::Upstream { status, body }
    }
}

/// Parse the body as JSON, or wrap it as plain text output.
pub fn normalize_response(raw: &str) -> serde_json::Value {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => serde_json::json!({ "output": raw, "isPlainText": true }),
    }
}

/// Sends chat requests to the upstream endpoint using session credentials.
pub struct RequestForwarder {
    chat_url: String,
    page_url: String,
    client: Client,
}

impl RequestForwarder {
    pub fn new(chat_url: String, page_url: String, timeout: Duration) -> Self {
        crate::ensure_crypto();
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { chat_url, page_url, client }
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    fn headers(&self, creds: &CredentialSet) -> HeaderMap {
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, USER_AGENT, BROWSER_USER_AGENT);
        if let Some(origin) = origin_of(&self.page_url) {
            insert_header(&mut headers, ORIGIN, &origin);
        }
        insert_header(&mut headers, REFERER, &self.page_url);
        if let Some(cookie) = creds.cookie_header() {
            insert_header(&mut headers, COOKIE, &cookie);
        }
        if let Some(ref key) = creds.api_key {
            insert_header(&mut headers, "api-key", key);
        }
        headers
    }

    /// Send `message` after `history` and return the normalized reply.
    pub async fn send(
        &self,
        creds: &CredentialSet,
        message: &str,
        history: &[ChatTurn],
        options: &ChatOptions,
    ) -> Result<serde_json::Value, ForwardError> {
        let req = OutboundRequest::build(message, history, options);
        let headers = self.headers(creds);
        let form = multipart::to_form(&req);

        tracing::debug!(
            url = %self.chat_url,
            turns = history.len() + 1,
            cookies = creds.cookies.len(),
            api_key = creds.api_key.is_some(),
            "forwarding chat request"
        );

        let resp = self
            .client
            .post(&self.chat_url)
            .headers(headers)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ForwardError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ForwardError::Transport(e.to_string()))?;

        if status.is_success() {
            return Ok(normalize_response(&text));
        }

        let err = classify(status.as_u16(), text);
        if err.is_auth() {
            tracing::warn!(status = status.as_u16(), "upstream rejected session credentials");
        } else {
            tracing::warn!(
                status = status.as_u16(),
                reason = status.canonical_reason().unwrap_or_default(),
                "upstream returned an error"
            );
        }
        Err(err)
    }
}

fn insert_header<K: reqwest::header::IntoHeaderName>(headers: &mut HeaderMap, key: K, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(key, v);
        }
        Err(e) => tracing::warn!(err = %e, "dropping header with invalid value"),
    }
}

/// `scheme://host[:port]` of a URL, if it has one.
fn origin_of(url: &str) -> Option<String> {
    let origin = Url::parse(url).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
