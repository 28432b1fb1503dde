// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential acquisition: visit the upstream chat page in a browser, let the
//! client-side session bootstrap, then read cookies and the in-page API key.

use std::fmt;
use std::time::Duration;

use crate::credential::browser::{BrowserLauncher, BrowserSession, LaunchOptions};
use crate::credential::Cookie;

/// Storage keys checked for the API key, in priority order.
pub const API_KEY_CANDIDATES: &[&str] =
    &["tryitApiKey", "tryit_api_key", "apiKey", "api_key", "api-key"];

/// Tunables for one acquisition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireOptions {
    pub headless: bool,
    /// Fixed wait after navigation for challenges and session bootstrap.
    pub wait_time: Duration,
    /// Whether to look up the API key in page storage.
    pub auto_extract: bool,
    pub navigation_timeout: Duration,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            headless: true,
            wait_time: Duration::from_secs(10),
            auto_extract: true,
            navigation_timeout: Duration::from_secs(60),
        }
    }
}

/// Result of a successful (possibly partial) acquisition.
///
/// A missing API key is not a failure: the cookies may still be usable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Acquired {
    pub cookies: Vec<Cookie>,
    pub api_key: Option<String>,
}

/// Why an acquisition failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    Launch(String),
    Navigation(String),
    NavigationTimeout(Duration),
    Cookies(String),
    Evaluate(String),
    /// The page yielded neither cookies nor an API key.
    NothingFound,
    /// The acquisition task died before reporting a result.
    Aborted(String),
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launch(e) => write!(f, "browser launch failed: {e}"),
            Self::Navigation(e) => write!(f, "navigation failed: {e}"),
            Self::NavigationTimeout(t) => {
                write!(f, "navigation did not settle within {}ms", t.as_millis())
            }
            Self::Cookies(e) => write!(f, "reading cookies failed: {e}"),
            Self::Evaluate(e) => write!(f, "api key lookup failed: {e}"),
            Self::NothingFound => f.write_str("no cookies or api key found on the page"),
            Self::Aborted(e) => write!(f, "credential acquisition aborted: {e}"),
        }
    }
}

impl std::error::Error for AcquisitionError {}

/// Run one acquisition against `page_url`.
///
/// The browser session is closed on every path once launched. Nothing is
/// persisted here; the caller decides what to keep.
pub async fn acquire(
    launcher: &dyn BrowserLauncher,
    page_url: &str,
    options: AcquireOptions,
) -> Result<Acquired, AcquisitionError> {
    tracing::info!(url = %page_url, headless = options.headless, "launching browser for credential acquisition");
    let mut session = launcher
        .launch(LaunchOptions { headless: options.headless })
        .await
        .map_err(|e| AcquisitionError::Launch(e.to_string()))?;

    let result = drive(session.as_mut(), page_url, options).await;

    if let Err(e) = session.close().await {
        tracing::warn!(err = %e, "failed to close browser session");
    }

    match result {
        Ok(ref acquired) => tracing::info!(
            cookies = acquired.cookies.len(),
            api_key = acquired.api_key.is_some(),
            "credential acquisition finished"
        ),
        Err(ref e) => tracing::warn!(err = %e, "credential acquisition failed"),
    }
    result
}

async fn drive(
    session: &mut dyn BrowserSession,
    page_url: &str,
    options: AcquireOptions,
) -> Result<Acquired, AcquisitionError> {
    match tokio::time::timeout(options.navigation_timeout, session.navigate(page_url)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(AcquisitionError::Navigation(e.to_string())),
        Err(_) => return Err(AcquisitionError::NavigationTimeout(options.navigation_timeout)),
    }

    tracing::debug!(wait_ms = options.wait_time.as_millis() as u64, "waiting for session bootstrap");
    tokio::time::sleep(options.wait_time).await;

    let cookies =
        session.read_cookies().await.map_err(|e| AcquisitionError::Cookies(e.to_string()))?;

    let api_key = if options.auto_extract {
        let value = session
            .evaluate_script(&api_key_lookup_script())
            .await
            .map_err(|e| AcquisitionError::Evaluate(e.to_string()))?;
        api_key_from_value(&value)
    } else {
        None
    };

    if api_key.is_none() && options.auto_extract {
        tracing::info!("no api key found in page storage");
    }

    Ok(Acquired { cookies, api_key })
}

/// Script that returns the first candidate key found in local or session
/// storage, or `null`.
pub fn api_key_lookup_script() -> String {
    let keys = serde_json::to_string(API_KEY_CANDIDATES).unwrap_or_else(|_| "[]".to_owned());
    format!(
        r#"(() => {{
  const keys = {keys};
  for (const store of [window.localStorage, window.sessionStorage]) {{
    for (const key of keys) {{
      try {{
        const value = store.getItem(key);
        if (value) return value;
      }} catch (e) {{}}
    }}
  }}
  return null;
}})()"#
    )
}

fn api_key_from_value(value: &serde_json::Value) -> Option<String> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
}

#[cfg(test)]
#[path = "acquire_tests.rs"]
mod tests;
