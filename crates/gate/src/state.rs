// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::GateConfig;
use crate::credential::acquire::AcquireOptions;
use crate::credential::browser::BrowserLauncher;
use crate::credential::manager::{CredentialManager, ManagerSettings};
use crate::credential::store::CredentialStore;
use crate::upstream::client::RequestForwarder;

/// Shared gateway state, constructed once per process and handed to every
/// handler.
pub struct GateState {
    pub config: GateConfig,
    pub shutdown: CancellationToken,
    pub credentials: Arc<CredentialManager>,
    pub forwarder: RequestForwarder,
}

impl GateState {
    pub fn new(
        config: GateConfig,
        launcher: Arc<dyn BrowserLauncher>,
        shutdown: CancellationToken,
    ) -> Self {
        let store = CredentialStore::new(config.data_dir());
        let credentials = CredentialManager::new(
            store,
            launcher,
            ManagerSettings {
                page_url: config.page_url.clone(),
                defaults: default_acquire_options(&config),
                fallback_api_key: config.fallback_api_key.clone(),
            },
        );
        let forwarder = RequestForwarder::new(
            config.chat_url.clone(),
            config.page_url.clone(),
            config.upstream_timeout(),
        );
        Self { config, shutdown, credentials, forwarder }
    }
}

/// Acquisition options derived from config, used for first-use
/// initialization and as defaults for manual refreshes.
pub fn default_acquire_options(config: &GateConfig) -> AcquireOptions {
    AcquireOptions {
        headless: !config.headful,
        wait_time: std::time::Duration::from_millis(config.wait_time_ms),
        auto_extract: true,
        navigation_timeout: config.navigation_timeout(),
    }
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
