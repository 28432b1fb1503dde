// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential manager: owns the in-memory credential set, runs first-use
//! initialization, and serializes browser refreshes.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::credential::acquire::{acquire, AcquireOptions, AcquisitionError};
use crate::credential::browser::BrowserLauncher;
use crate::credential::store::CredentialStore;
use crate::credential::{epoch_secs, is_valid, CredentialSet};

/// Lifecycle of the process-wide credential state.
///
/// `Ready` is sticky: failed sends or failed refreshes never move back to
/// `Uninitialized` once credentials have been established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Uninitialized,
    Initializing,
    Ready,
}

impl Lifecycle {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Initializing,
            2 => Self::Ready,
            _ => Self::Uninitialized,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Initializing => 1,
            Self::Ready => 2,
        }
    }
}

/// Outcome of a successful refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub cookie_count: usize,
    pub api_key_found: bool,
}

/// Point-in-time view used by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSummary {
    pub lifecycle: Lifecycle,
    pub initialized: bool,
    pub api_key_loaded: bool,
    pub cookie_count: usize,
}

/// Acquisition settings fixed at startup.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub page_url: String,
    /// Options used for first-use initialization.
    pub defaults: AcquireOptions,
    /// Key to use when an acquisition finds none. Never applied implicitly.
    pub fallback_api_key: Option<String>,
}

type RefreshResult = Result<RefreshSummary, AcquisitionError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// Owns the session credentials for the whole process.
pub struct CredentialManager {
    store: CredentialStore,
    launcher: Arc<dyn BrowserLauncher>,
    settings: ManagerSettings,
    credentials: RwLock<CredentialSet>,
    lifecycle: AtomicU8,
    /// Set once credentials were first established; never cleared.
    ready: AtomicBool,
    init_lock: Mutex<()>,
    in_flight: Mutex<Option<(u64, SharedRefresh)>>,
    refresh_seq: AtomicU64,
}

impl CredentialManager {
    pub fn new(
        store: CredentialStore,
        launcher: Arc<dyn BrowserLauncher>,
        settings: ManagerSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            launcher,
            settings,
            credentials: RwLock::new(CredentialSet::default()),
            lifecycle: AtomicU8::new(Lifecycle::Uninitialized.as_u8()),
            ready: AtomicBool::new(false),
            init_lock: Mutex::new(()),
            in_flight: Mutex::new(None),
            refresh_seq: AtomicU64::new(0),
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::SeqCst))
    }

    fn set_lifecycle(&self, state: Lifecycle) {
        self.lifecycle.store(state.as_u8(), Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
        self.set_lifecycle(Lifecycle::Ready);
    }

    /// Clone of the current credentials for one outbound request.
    pub async fn snapshot(&self) -> CredentialSet {
        self.credentials.read().await.clone()
    }

    pub async fn summary(&self) -> CredentialSummary {
        let creds = self.credentials.read().await;
        CredentialSummary {
            lifecycle: self.lifecycle(),
            initialized: self.is_ready(),
            api_key_loaded: creds.api_key.is_some(),
            cookie_count: creds.cookies.len(),
        }
    }

    /// Make sure credentials are established, loading from disk or running a
    /// browser acquisition on first use.
    ///
    /// Concurrent callers share a single initialization attempt. On failure
    /// the state returns to `Uninitialized` so a later call can retry.
    pub async fn ensure_ready(self: &Arc<Self>) -> Result<(), AcquisitionError> {
        if self.is_ready() {
            return Ok(());
        }
        let _guard = self.init_lock.lock().await;
        if self.is_ready() {
            return Ok(());
        }

        self.set_lifecycle(Lifecycle::Initializing);
        if let Some(persisted) = self.store.load() {
            if is_valid(&persisted, epoch_secs()) || persisted.api_key.is_some() {
                tracing::info!(
                    cookies = persisted.cookies.len(),
                    api_key = persisted.api_key.is_some(),
                    dir = %self.store.dir().display(),
                    "loaded persisted credentials"
                );
                *self.credentials.write().await = persisted;
                self.mark_ready();
                return Ok(());
            }
            tracing::info!("persisted credentials are expired or empty");
        }

        tracing::info!("no usable credentials on disk, acquiring via browser");
        self.refresh(self.settings.defaults).await.map(|_| ())
    }

    /// Re-acquire credentials through the browser.
    ///
    /// Only one acquisition runs at a time; overlapping callers await the same
    /// outcome. On failure the previous in-memory credentials are kept as-is.
    pub async fn refresh(self: &Arc<Self>, options: AcquireOptions) -> RefreshResult {
        let pending = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some((_, pending)) => {
                    tracing::debug!("joining in-flight credential refresh");
                    pending.clone()
                }
                None => {
                    let id = self.refresh_seq.fetch_add(1, Ordering::SeqCst);
                    let this = Arc::clone(self);
                    let task = tokio::spawn(async move {
                        let result = this.run_refresh(options).await;
                        this.clear_in_flight(id).await;
                        result
                    });
                    let this = Arc::clone(self);
                    let pending = async move {
                        let result = match task.await {
                            Ok(result) => result,
                            Err(e) => {
                                tracing::error!(err = %e, "credential refresh task failed");
                                this.settle_lifecycle();
                                Err(AcquisitionError::Aborted(e.to_string()))
                            }
                        };
                        // The task cannot clear the slot when it panicked.
                        this.clear_in_flight(id).await;
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some((id, pending.clone()));
                    pending
                }
            }
        };
        pending.await
    }

    /// Drop the in-flight refresh if it is still refresh `id`.
    async fn clear_in_flight(&self, id: u64) {
        let mut slot = self.in_flight.lock().await;
        if slot.as_ref().is_some_and(|(current, _)| *current == id) {
            slot.take();
        }
    }

    /// Leave `Initializing` after a failed acquisition without regressing `Ready`.
    fn settle_lifecycle(&self) {
        self.set_lifecycle(if self.is_ready() { Lifecycle::Ready } else { Lifecycle::Uninitialized });
    }

    async fn run_refresh(&self, options: AcquireOptions) -> RefreshResult {
        self.set_lifecycle(Lifecycle::Initializing);

        let outcome = acquire(self.launcher.as_ref(), &self.settings.page_url, options)
            .await
            .and_then(|acquired| {
                if acquired.cookies.is_empty() && acquired.api_key.is_none() {
                    Err(AcquisitionError::NothingFound)
                } else {
                    Ok(acquired)
                }
            });

        let acquired = match outcome {
            Ok(a) => a,
            Err(e) => {
                self.settle_lifecycle();
                return Err(e);
            }
        };

        let api_key = match acquired.api_key {
            Some(key) => Some(key),
            None => {
                if self.settings.fallback_api_key.is_some() {
                    tracing::info!("no api key acquired, using configured fallback key");
                }
                self.settings.fallback_api_key.clone()
            }
        };
        let set = CredentialSet::new(acquired.cookies, api_key);
        let summary = RefreshSummary {
            cookie_count: set.cookies.len(),
            api_key_found: set.api_key.is_some(),
        };

        if let Err(e) = self.store.save(&set) {
            tracing::warn!(err = %e, "failed to persist refreshed credentials");
        }
        *self.credentials.write().await = set;
        self.mark_ready();

        tracing::info!(
            cookies = summary.cookie_count,
            api_key = summary.api_key_found,
            "credentials refreshed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
