// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential persistence: cookie jar and API key as two independent files.
//!
//! Either artifact may be missing without affecting the other. Reads never
//! fail; an unreadable file is a cold start.

use std::path::{Path, PathBuf};

use crate::credential::{Cookie, CredentialSet};

const COOKIES_FILE: &str = "cookies.json";
const API_KEY_FILE: &str = "api_key.txt";

/// File-backed store for one [`CredentialSet`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cookies_path(&self) -> PathBuf {
        self.dir.join(COOKIES_FILE)
    }

    pub fn api_key_path(&self) -> PathBuf {
        self.dir.join(API_KEY_FILE)
    }

    /// Load whatever is on disk. `None` when neither artifact is present.
    pub fn load(&self) -> Option<CredentialSet> {
        let cookies = self.load_cookies();
        let api_key = self.load_api_key();
        if cookies.is_none() && api_key.is_none() {
            return None;
        }
        Some(CredentialSet { cookies: cookies.unwrap_or_default(), api_key })
    }

    fn load_cookies(&self) -> Option<Vec<Cookie>> {
        let path = self.cookies_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(path = %path.display(), err = %e, "no cookie jar loaded");
                return None;
            }
        };
        match serde_json::from_str::<Vec<Cookie>>(&contents) {
            Ok(cookies) => Some(cookies),
            Err(e) => {
                tracing::warn!(path = %path.display(), err = %e, "ignoring unreadable cookie jar");
                None
            }
        }
    }

    fn load_api_key(&self) -> Option<String> {
        let path = self.api_key_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let key = contents.trim();
                if key.is_empty() {
                    None
                } else {
                    Some(key.to_owned())
                }
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), err = %e, "no api key loaded");
                None
            }
        }
    }

    /// Overwrite both artifacts with `set`.
    ///
    /// A set without an API key removes the key file so the pair on disk
    /// always mirrors the in-memory set.
    pub fn save(&self, set: &CredentialSet) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(&set.cookies)?;
        write_atomic(&self.cookies_path(), json.as_bytes())?;

        let key_path = self.api_key_path();
        match set.api_key {
            Some(ref key) => write_atomic(&key_path, key.as_bytes())?,
            None => match std::fs::remove_file(&key_path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }

        tracing::debug!(
            dir = %self.dir.display(),
            cookies = set.cookies.len(),
            api_key = set.api_key.is_some(),
            "credentials saved"
        );
        Ok(())
    }
}

/// Write via a uniquely named temp file and rename over the target.
fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
