// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for the sessiongate proxy.
#[derive(Debug, Clone, clap::Args)]
pub struct GateConfig {
    /// Host to bind on.
    #[arg(long, global = true, default_value = "0.0.0.0", env = "SESSIONGATE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, global = true, default_value_t = 3000, env = "PORT")]
    pub port: u16,

    /// Directory holding the persisted cookie jar and API key.
    #[arg(long, global = true, env = "SESSIONGATE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Upstream chat page visited by the browser to establish a session.
    #[arg(long, global = true, default_value = DEFAULT_PAGE_URL, env = "SESSIONGATE_PAGE_URL")]
    pub page_url: String,

    /// Upstream chat endpoint that receives forwarded messages.
    #[arg(long, global = true, default_value = DEFAULT_CHAT_URL, env = "SESSIONGATE_CHAT_URL")]
    pub chat_url: String,

    /// Timeout for one upstream chat request, in milliseconds.
    #[arg(long, global = true, default_value_t = 120_000, env = "SESSIONGATE_UPSTREAM_TIMEOUT_MS")]
    pub upstream_timeout_ms: u64,

    /// Timeout for the browser navigation to settle, in milliseconds.
    #[arg(long, global = true, default_value_t = 60_000, env = "SESSIONGATE_NAVIGATION_TIMEOUT_MS")]
    pub navigation_timeout_ms: u64,

    /// Default post-navigation wait before reading cookies, in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000, env = "SESSIONGATE_WAIT_TIME_MS")]
    pub wait_time_ms: u64,

    /// Show the browser window during automatic acquisition.
    #[arg(long, global = true, env = "SESSIONGATE_HEADFUL")]
    pub headful: bool,

    /// Browser binary for acquisition. Auto-detected when unset.
    #[arg(long, global = true, env = "SESSIONGATE_BROWSER_PATH")]
    pub browser_path: Option<PathBuf>,

    /// API key used when an acquisition finds no key in page storage.
    #[arg(long, global = true, env = "SESSIONGATE_FALLBACK_API_KEY", hide_env_values = true)]
    pub fallback_api_key: Option<String>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "SESSIONGATE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

pub const DEFAULT_PAGE_URL: &str = "https://deepai.org/chat";
pub const DEFAULT_CHAT_URL: &str = "https://api.deepai.org/hacking_is_a_serious_crime";

impl GateConfig {
    /// Resolve the data directory.
    ///
    /// Checks `--data-dir`, then `$XDG_STATE_HOME/sessiongate`,
    /// then `$HOME/.local/state/sessiongate`, then `./data`.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.data_dir {
            return dir.clone();
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return PathBuf::from(xdg).join("sessiongate");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local/state/sessiongate");
        }
        PathBuf::from("data")
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
