// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::error;

use sessiongate::config::{GateConfig, LogFormat};
use sessiongate::credential::browser::{BrowserLauncher, ChromiumLauncher};
use sessiongate::credential::manager::{CredentialManager, ManagerSettings};
use sessiongate::credential::store::CredentialStore;
use sessiongate::state::default_acquire_options;

#[derive(Debug, Parser)]
#[command(name = "sessiongate", version, about = "Session-backed chat API proxy")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    config: GateConfig,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP gateway (default).
    Serve,
    /// Acquire fresh cookies and API key in a browser, then persist them.
    Refresh(RefreshArgs),
}

#[derive(Debug, clap::Args)]
struct RefreshArgs {
    /// Override the post-navigation wait, in milliseconds.
    #[arg(long = "wait")]
    wait_ms: Option<u64>,

    /// Skip the page storage lookup for the API key.
    #[arg(long)]
    no_extract: bool,
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = match format {
        LogFormat::Json => fmt::fmt().with_env_filter(filter).json().try_init(),
        LogFormat::Text => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

fn launcher_for(config: &GateConfig) -> Arc<dyn BrowserLauncher> {
    let mut launcher = ChromiumLauncher::new();
    if let Some(ref path) = config.browser_path {
        launcher = launcher.with_executable(path.clone());
    }
    Arc::new(launcher)
}

/// One acquisition from the command line, persisted for the next `serve`.
async fn refresh(config: GateConfig, args: RefreshArgs) -> anyhow::Result<()> {
    let mut options = default_acquire_options(&config);
    if let Some(ms) = args.wait_ms {
        options.wait_time = Duration::from_millis(ms);
    }
    options.auto_extract = !args.no_extract;

    let store = CredentialStore::new(config.data_dir());
    let dir = store.dir().to_path_buf();
    let manager = CredentialManager::new(
        store,
        launcher_for(&config),
        ManagerSettings {
            page_url: config.page_url.clone(),
            defaults: options,
            fallback_api_key: config.fallback_api_key.clone(),
        },
    );

    let summary = manager.refresh(options).await?;
    println!(
        "saved {} cookie(s), api key {} -> {}",
        summary.cookie_count,
        if summary.api_key_found { "found" } else { "not found" },
        dir.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.config.log_format);

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let launcher = launcher_for(&cli.config);
            sessiongate::run(cli.config, launcher).await
        }
        Command::Refresh(args) => refresh(cli.config, args).await,
    };

    if let Err(e) = result {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
