// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a scriptable browser, a stand-in upstream
//! chat server, and config builders.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use indexmap::IndexMap;
use tokio::task::JoinHandle;

use crate::config::{GateConfig, LogFormat};
use crate::credential::browser::{BrowserError, BrowserLauncher, BrowserSession, LaunchOptions};
use crate::credential::Cookie;

// -- Browser ------------------------------------------------------------------

/// Scripted outcome of a fake browser run.
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Navigation succeeds; cookies and storage lookup return these values.
    Serve { cookies: Vec<Cookie>, storage: serde_json::Value },
    LaunchFails(String),
    NavigationFails(String),
    /// Navigation never settles.
    NavigationHangs,
    EvaluateFails(String),
}

/// In-memory [`BrowserLauncher`] with call counters.
pub struct FakeLauncher {
    behavior: Mutex<FakeBehavior>,
    launch_delay: Duration,
    pub launches: Arc<AtomicU32>,
    pub closes: Arc<AtomicU32>,
    pub last_url: Arc<Mutex<Option<String>>>,
    pub last_headless: Arc<Mutex<Option<bool>>>,
}

impl FakeLauncher {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            launch_delay: Duration::ZERO,
            launches: Arc::new(AtomicU32::new(0)),
            closes: Arc::new(AtomicU32::new(0)),
            last_url: Arc::new(Mutex::new(None)),
            last_headless: Arc::new(Mutex::new(None)),
        }
    }

    /// Serve `cookies` and report `api_key` from page storage.
    pub fn serving(cookies: Vec<Cookie>, api_key: Option<&str>) -> Self {
        let storage = api_key.map(serde_json::Value::from).unwrap_or(serde_json::Value::Null);
        Self::new(FakeBehavior::Serve { cookies, storage })
    }

    pub fn failing_launch(message: &str) -> Self {
        Self::new(FakeBehavior::LaunchFails(message.to_owned()))
    }

    /// Delay every launch, to widen race windows in concurrency tests.
    pub fn with_launch_delay(mut self, delay: Duration) -> Self {
        self.launch_delay = delay;
        self
    }

    pub fn set_behavior(&self, behavior: FakeBehavior) {
        if let Ok(mut guard) = self.behavior.lock() {
            *guard = behavior;
        }
    }

    pub fn launch_count(&self) -> u32 {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().ok().and_then(|g| g.clone())
    }

    pub fn last_headless(&self) -> Option<bool> {
        self.last_headless.lock().ok().and_then(|g| *g)
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, options: LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_headless.lock() {
            *guard = Some(options.headless);
        }
        if !self.launch_delay.is_zero() {
            tokio::time::sleep(self.launch_delay).await;
        }
        let behavior = self
            .behavior
            .lock()
            .map(|g| g.clone())
            .map_err(|_| BrowserError::new("behavior lock poisoned"))?;
        if let FakeBehavior::LaunchFails(ref msg) = behavior {
            return Err(BrowserError::new(msg.clone()));
        }
        Ok(Box::new(FakeSession {
            behavior,
            closes: Arc::clone(&self.closes),
            last_url: Arc::clone(&self.last_url),
        }))
    }
}

struct FakeSession {
    behavior: FakeBehavior,
    closes: Arc<AtomicU32>,
    last_url: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        if let Ok(mut guard) = self.last_url.lock() {
            *guard = Some(url.to_owned());
        }
        match self.behavior {
            FakeBehavior::NavigationFails(ref msg) => Err(BrowserError::new(msg.clone())),
            FakeBehavior::NavigationHangs => {
                std::future::pending::<()>().await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn read_cookies(&mut self) -> Result<Vec<Cookie>, BrowserError> {
        match self.behavior {
            FakeBehavior::Serve { ref cookies, .. } => Ok(cookies.clone()),
            _ => Ok(vec![Cookie::new("session", "partial")]),
        }
    }

    async fn evaluate_script(&mut self, _script: &str) -> Result<serde_json::Value, BrowserError> {
        match self.behavior {
            FakeBehavior::Serve { ref storage, .. } => Ok(storage.clone()),
            FakeBehavior::EvaluateFails(ref msg) => Err(BrowserError::new(msg.clone())),
            _ => Ok(serde_json::Value::Null),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// -- Upstream -----------------------------------------------------------------

/// One request received by [`FakeUpstream`], with its form fields decoded.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub headers: HeaderMap,
    /// Field name -> text value, in the order the parts arrived.
    pub fields: IndexMap<String, String>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
    }
}

struct UpstreamInner {
    reply: Mutex<(u16, String)>,
    captured: Mutex<Vec<CapturedRequest>>,
}

/// Local HTTP server standing in for the upstream chat endpoint.
pub struct FakeUpstream {
    pub url: String,
    inner: Arc<UpstreamInner>,
    task: JoinHandle<()>,
}

impl FakeUpstream {
    /// Start a server answering every `POST /chat` with `status` and `body`.
    pub async fn start(status: u16, body: &str) -> anyhow::Result<Self> {
        let inner = Arc::new(UpstreamInner {
            reply: Mutex::new((status, body.to_owned())),
            captured: Mutex::new(Vec::new()),
        });
        let router = Router::new().route("/chat", post(upstream_chat)).with_state(Arc::clone(&inner));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(Self { url: format!("http://{addr}/chat"), inner, task })
    }

    pub fn set_reply(&self, status: u16, body: &str) {
        if let Ok(mut guard) = self.inner.reply.lock() {
            *guard = (status, body.to_owned());
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.inner.captured.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<CapturedRequest> {
        self.requests().pop()
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn upstream_chat(
    State(inner): State<Arc<UpstreamInner>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let fields = match read_fields(&mut multipart).await {
        Ok(fields) => fields,
        Err(e) => return (StatusCode::BAD_REQUEST, e.body_text()).into_response(),
    };
    if let Ok(mut captured) = inner.captured.lock() {
        captured.push(CapturedRequest { headers, fields });
    }
    let (status, body) = inner.reply.lock().map(|g| g.clone()).unwrap_or((500, String::new()));
    (StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), body).into_response()
}

async fn read_fields(multipart: &mut Multipart) -> Result<IndexMap<String, String>, MultipartError> {
    let mut fields = IndexMap::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        fields.insert(name, field.text().await?);
    }
    Ok(fields)
}

// -- Config -------------------------------------------------------------------

/// Config pointing at `data_dir` and `chat_url` with short browser timings.
pub fn test_config(data_dir: &Path, chat_url: &str) -> GateConfig {
    GateConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        data_dir: Some(data_dir.to_path_buf()),
        page_url: "https://chat.example.test/chat".to_owned(),
        chat_url: chat_url.to_owned(),
        upstream_timeout_ms: 5_000,
        navigation_timeout_ms: 200,
        wait_time_ms: 0,
        headful: false,
        browser_path: None,
        fallback_api_key: None,
        log_format: LogFormat::Text,
    }
}
