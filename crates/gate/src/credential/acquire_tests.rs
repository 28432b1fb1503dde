// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::test_support::{FakeBehavior, FakeLauncher};

const PAGE: &str = "https://chat.example.test/chat";

fn options() -> AcquireOptions {
    AcquireOptions {
        headless: true,
        wait_time: Duration::ZERO,
        auto_extract: true,
        navigation_timeout: Duration::from_millis(100),
    }
}

#[tokio::test]
async fn returns_cookies_and_key_and_closes_browser() -> anyhow::Result<()> {
    let launcher = FakeLauncher::serving(vec![Cookie::new("sid", "1")], Some("tryit-77-abc"));
    let acquired = acquire(&launcher, PAGE, options()).await?;

    assert_eq!(acquired.cookies, vec![Cookie::new("sid", "1")]);
    assert_eq!(acquired.api_key.as_deref(), Some("tryit-77-abc"));
    assert_eq!(launcher.last_url().as_deref(), Some(PAGE));
    assert_eq!(launcher.close_count(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_key_is_partial_success() -> anyhow::Result<()> {
    let launcher = FakeLauncher::serving(vec![Cookie::new("sid", "1")], None);
    let acquired = acquire(&launcher, PAGE, options()).await?;
    assert_eq!(acquired.cookies.len(), 1);
    assert_eq!(acquired.api_key, None);
    Ok(())
}

#[tokio::test]
async fn auto_extract_disabled_skips_key_lookup() -> anyhow::Result<()> {
    let launcher = FakeLauncher::serving(vec![Cookie::new("sid", "1")], Some("tryit-1-1"));
    let acquired = acquire(&launcher, PAGE, AcquireOptions { auto_extract: false, ..options() }).await?;
    assert_eq!(acquired.api_key, None);
    Ok(())
}

#[tokio::test]
async fn headless_flag_reaches_launcher() -> anyhow::Result<()> {
    let launcher = FakeLauncher::serving(vec![], None);
    acquire(&launcher, PAGE, AcquireOptions { headless: false, ..options() }).await?;
    assert_eq!(launcher.last_headless(), Some(false));
    Ok(())
}

#[tokio::test]
async fn launch_failure_is_reported() {
    let launcher = FakeLauncher::failing_launch("no chrome binary");
    let result = acquire(&launcher, PAGE, options()).await;
    assert_eq!(result, Err(AcquisitionError::Launch("no chrome binary".to_owned())));
    assert_eq!(launcher.close_count(), 0);
}

#[tokio::test]
async fn navigation_timeout_fails_and_still_closes() {
    let launcher = FakeLauncher::new(FakeBehavior::NavigationHangs);
    let result = acquire(&launcher, PAGE, options()).await;
    assert_eq!(result, Err(AcquisitionError::NavigationTimeout(Duration::from_millis(100))));
    assert_eq!(launcher.close_count(), 1);
}

#[tokio::test]
async fn navigation_error_fails_and_still_closes() {
    let launcher = FakeLauncher::new(FakeBehavior::NavigationFails("net::ERR_NAME_NOT_RESOLVED".to_owned()));
    let result = acquire(&launcher, PAGE, options()).await;
    assert!(matches!(result, Err(AcquisitionError::Navigation(_))));
    assert_eq!(launcher.close_count(), 1);
}

#[tokio::test]
async fn evaluate_error_fails_and_still_closes() {
    let launcher = FakeLauncher::new(FakeBehavior::EvaluateFails("context destroyed".to_owned()));
    let result = acquire(&launcher, PAGE, options()).await;
    assert_eq!(result, Err(AcquisitionError::Evaluate("context destroyed".to_owned())));
    assert_eq!(launcher.close_count(), 1);
}

#[test]
fn lookup_script_checks_every_candidate() {
    let script = api_key_lookup_script();
    for key in API_KEY_CANDIDATES {
        assert!(script.contains(&format!("\"{key}\"")), "missing {key}");
    }
    assert!(script.contains("localStorage"));
    assert!(script.contains("sessionStorage"));
}

#[test]
fn blank_or_non_string_storage_values_are_ignored() {
    assert_eq!(api_key_from_value(&serde_json::Value::Null), None);
    assert_eq!(api_key_from_value(&serde_json::json!("  ")), None);
    assert_eq!(api_key_from_value(&serde_json::json!(42)), None);
    assert_eq!(api_key_from_value(&serde_json::json!(" tryit-5 ")).as_deref(), Some("tryit-5"));
}
