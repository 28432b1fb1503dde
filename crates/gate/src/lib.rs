// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sessiongate: HTTP proxy that forwards chat requests to a browser-session
//! backed upstream chat API.

pub mod config;
pub mod credential;
pub mod error;
pub mod state;
pub mod test_support;
pub mod transport;
pub mod upstream;

use std::sync::{Arc, Once};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::GateConfig;
use crate::credential::browser::BrowserLauncher;
use crate::state::GateState;
use crate::transport::build_router;

/// Install the ring TLS provider for reqwest. Safe to call repeatedly.
pub fn ensure_crypto() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Run the gateway until SIGINT/SIGTERM.
pub async fn run(config: GateConfig, launcher: Arc<dyn BrowserLauncher>) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let shutdown = CancellationToken::new();
    let state = Arc::new(GateState::new(config, launcher, shutdown.clone()));

    tracing::info!(
        data_dir = %state.credentials.store().dir().display(),
        chat_url = %state.forwarder.chat_url(),
        "sessiongate starting"
    );

    // Warm credentials so the first request does not pay for a browser run.
    {
        let credentials = Arc::clone(&state.credentials);
        let sd = state.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = credentials.ensure_ready() => {
                    if let Err(e) = result {
                        tracing::warn!(err = %e, "startup credential initialization failed, retrying on first request");
                    }
                }
                _ = sd.cancelled() => {}
            }
        });
    }

    spawn_signal_handler(state.shutdown.clone());

    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("sessiongate listening on {addr}");
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    tracing::info!("sessiongate stopped");
    Ok(())
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGTERM");
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGINT");
            }
            _ = shutdown.cancelled() => return,
        }
        shutdown.cancel();
    });
}
