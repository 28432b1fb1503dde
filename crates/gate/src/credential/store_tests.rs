// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample_set() -> CredentialSet {
    CredentialSet::new(
        vec![
            Cookie::new("sessionid", "abc").with_expires(4_000_000_000.0),
            Cookie::new("csrftoken", "xyz"),
        ],
        Some("tryit-41923-deadbeef".to_owned()),
    )
}

#[test]
fn load_from_empty_dir_is_absent() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = CredentialStore::new(dir.path());
    assert_eq!(store.load(), None);
    Ok(())
}

#[test]
fn save_then_load_returns_same_set() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = CredentialStore::new(dir.path());
    store.save(&sample_set())?;
    assert_eq!(store.load(), Some(sample_set()));
    Ok(())
}

#[test]
fn save_creates_missing_directory() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = CredentialStore::new(dir.path().join("nested/data"));
    store.save(&sample_set())?;
    assert!(store.cookies_path().exists());
    assert!(store.api_key_path().exists());
    Ok(())
}

#[test]
fn api_key_without_cookie_jar_still_loads() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = CredentialStore::new(dir.path());
    std::fs::write(store.api_key_path(), "tryit-1-2\n")?;

    let set = store.load().ok_or_else(|| anyhow::anyhow!("expected a set"))?;
    assert!(set.cookies.is_empty());
    assert_eq!(set.api_key.as_deref(), Some("tryit-1-2"));
    Ok(())
}

#[test]
fn corrupt_cookie_jar_does_not_hide_api_key() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = CredentialStore::new(dir.path());
    std::fs::write(store.cookies_path(), "{not json")?;
    std::fs::write(store.api_key_path(), "tryit-9-9")?;

    let set = store.load().ok_or_else(|| anyhow::anyhow!("expected a set"))?;
    assert!(set.cookies.is_empty());
    assert_eq!(set.api_key.as_deref(), Some("tryit-9-9"));
    Ok(())
}

#[test]
fn blank_api_key_file_is_absent() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = CredentialStore::new(dir.path());
    std::fs::write(store.api_key_path(), "  \n")?;
    assert_eq!(store.load(), None);
    Ok(())
}

#[test]
fn saving_without_key_removes_stale_key_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = CredentialStore::new(dir.path());
    store.save(&sample_set())?;

    let keyless = CredentialSet::new(vec![Cookie::new("sessionid", "new")], None);
    store.save(&keyless)?;

    assert!(!store.api_key_path().exists());
    assert_eq!(store.load(), Some(keyless));
    Ok(())
}

#[test]
fn cookie_jar_is_a_json_array() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = CredentialStore::new(dir.path());
    store.save(&sample_set())?;

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(store.cookies_path())?)?;
    let arr = raw.as_array().ok_or_else(|| anyhow::anyhow!("expected array"))?;
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["name"], "sessionid");
    assert!(arr[1].get("expires").is_none());
    Ok(())
}

#[test]
fn jar_with_session_cookie_convention_loads_as_valid() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("cookies.json"),
        r#"[{"name":"sid","value":"abc","domain":".example.test","path":"/","expires":-1}]"#,
    )?;
    let set = CredentialStore::new(dir.path()).load().ok_or_else(|| anyhow::anyhow!("nothing loaded"))?;
    assert_eq!(set.cookies.len(), 1);
    assert!(crate::credential::is_valid(&set, crate::credential::epoch_secs()));
    Ok(())
}
