// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session credentials: browser-acquired cookies plus an optional API key.
//!
//! The set is acquired by driving a headless browser against the upstream
//! chat page ([`acquire`]), persisted as two independent files ([`store`]),
//! and held in memory by the [`manager`] for injection into every forwarded
//! request.

pub mod acquire;
pub mod browser;
pub mod manager;
pub mod store;

use serde::{Deserialize, Serialize};

/// A single cookie read from the browser's cookie jar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Expiry as epoch seconds. `None` or non-positive for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
}

fn default_path() -> String {
    "/".to_owned()
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: default_path(),
            expires: None,
        }
    }

    pub fn with_expires(mut self, expires: f64) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Whether this cookie is still usable at `now` (epoch seconds).
    ///
    /// A non-positive expiry is the session-cookie convention (`-1`), not a
    /// timestamp in the past.
    pub fn is_live(&self, now: f64) -> bool {
        match self.expires {
            Some(at) if at > 0.0 => at > now,
            _ => true,
        }
    }
}

/// Cookies and API key used to authenticate against the upstream.
///
/// Replaced wholesale on every refresh; never merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialSet {
    pub cookies: Vec<Cookie>,
    pub api_key: Option<String>,
}

impl CredentialSet {
    pub fn new(cookies: Vec<Cookie>, api_key: Option<String>) -> Self {
        Self { cookies, api_key }
    }

    /// Build a `Cookie` header value, preserving stored order.
    ///
    /// Returns `None` when there are no cookies.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> =
            self.cookies.iter().map(|c| format!("{}={}", c.name, c.value)).collect();
        Some(pairs.join("; "))
    }
}

/// True iff the set has at least one cookie and no cookie has expired.
///
/// The API key is not inspected; its presence alone is treated as valid.
pub fn is_valid(set: &CredentialSet, now: f64) -> bool {
    !set.cookies.is_empty() && set.cookies.iter().all(|c| c.is_live(now))
}

/// Current time as fractional epoch seconds.
pub fn epoch_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
