// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Browser capability used for credential acquisition.
//!
//! Acquisition only needs four operations on a page, so the driver is hidden
//! behind [`BrowserLauncher`] / [`BrowserSession`]. [`ChromiumLauncher`] is the
//! production implementation over the Chrome DevTools Protocol.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::credential::Cookie;

/// Error reported by a browser driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserError(pub String);

impl BrowserError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BrowserError {}

fn map_cdp_error<E: fmt::Display>(err: E) -> BrowserError {
    BrowserError(err.to_string())
}

/// Options passed to [`BrowserLauncher::launch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOptions {
    pub headless: bool,
}

/// Starts browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// One open browser with a single page.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait for the page load to settle.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Read the page's cookie jar.
    async fn read_cookies(&mut self) -> Result<Vec<Cookie>, BrowserError>;

    /// Evaluate a script in the page and return its JSON result.
    async fn evaluate_script(&mut self, script: &str) -> Result<serde_json::Value, BrowserError>;

    /// Release the browser process.
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

/// Chromium flags that keep the automation surface out of page-visible state.
const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-dev-shm-usage",
];

/// Launches a local Chromium via CDP.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
}

impl ChromiumLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit browser binary instead of auto-detection.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    fn build_config(&self, options: LaunchOptions) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1366, 900)
            .args(STEALTH_ARGS.iter().copied());
        if let Some(ref path) = self.executable {
            builder = builder.chrome_executable(path);
        }
        if !options.headless {
            builder = builder.with_head();
        }
        builder.build().map_err(BrowserError)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, options: LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let config = self.build_config(options)?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(map_cdp_error)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(err = %e, "cdp handler error");
                }
            }
        });

        let mut session = ChromiumSession { browser, handler, page: None };
        match session.open_page().await {
            Ok(()) => Ok(Box::new(session)),
            Err(e) => {
                let _ = Box::new(session).close().await;
                Err(e)
            }
        }
    }
}

struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
}

impl ChromiumSession {
    async fn open_page(&mut self) -> Result<(), BrowserError> {
        let page = self.browser.new_page("about:blank").await.map_err(map_cdp_error)?;
        page.enable_stealth_mode().await.map_err(map_cdp_error)?;
        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page, BrowserError> {
        self.page.as_ref().ok_or_else(|| BrowserError::new("page not open"))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.page()?.goto(url).await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn read_cookies(&mut self) -> Result<Vec<Cookie>, BrowserError> {
        let cookies = self.page()?.get_cookies().await.map_err(map_cdp_error)?;
        Ok(cookies
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                // CDP reports session cookies with `session: true` and expires = -1.
                expires: if c.session || c.expires <= 0.0 { None } else { Some(c.expires) },
            })
            .collect())
    }

    async fn evaluate_script(&mut self, script: &str) -> Result<serde_json::Value, BrowserError> {
        let result = self.page()?.evaluate(script).await.map_err(map_cdp_error)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn close(mut self: Box<Self>) -> Result<(), BrowserError> {
        self.page = None;
        let closed = self.browser.close().await.map(|_| ()).map_err(map_cdp_error);
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(err = %e, "browser process wait failed");
        }
        self.handler.abort();
        closed
    }
}
