//! Versioned JSON storage, one file per project scope.
//!
//! The file name is the first 12 hex chars of `sha256("root|branch")`, so each
//! repository/branch pair gets its own bookmark set inside the data directory.
//! Nothing in here returns an error to the caller: failures are logged and
//! degrade to `false` on save and an empty set on load.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::scope::ProjectScope;
use crate::bookmark::Bookmark;

/// The only storage format version this build reads or writes.
pub const FORMAT_VERSION: u64 = 1;

#[derive(Serialize)]
struct StorageFile<'a> {
    version: u64,
    bookmarks: &'a [Bookmark],
}

/// Storage location and codec for the active scope.
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
    scope: ProjectScope,
}

impl Storage {
    pub fn new(data_dir: impl Into<PathBuf>, scope: ProjectScope) -> Self {
        Self {
            data_dir: data_dir.into(),
            scope,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Point at another data directory. Expands `~`.
    pub fn set_data_dir(&mut self, dir: &str) {
        self.data_dir = PathBuf::from(crate::config::normalize_data_dir(dir));
        tracing::info!(data_dir = %self.data_dir.display(), "bookmark data directory set");
    }

    pub fn scope(&self) -> &ProjectScope {
        &self.scope
    }

    pub fn set_scope(&mut self, scope: ProjectScope) {
        self.scope = scope;
    }

    /// `data_dir/<sha256(key)[..12]>.json` for the current scope.
    pub fn path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.json", scope_hash(&self.scope)))
    }

    /// Write the full set. Returns `false` (after logging) on any failure.
    pub fn save(&self, bookmarks: &[Bookmark]) -> bool {
        let path = self.path();
        match write_file(&path, bookmarks) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), count = bookmarks.len(), "bookmarks saved");
                true
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %format!("{e:#}"), "failed to save bookmarks");
                false
            }
        }
    }

    /// Read the set for the current scope. Missing file is an empty set.
    pub fn load(&self) -> Vec<Bookmark> {
        let path = self.path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no bookmark file yet");
            return Vec::new();
        }
        match read_file(&path) {
            Ok(bookmarks) => {
                tracing::debug!(path = %path.display(), count = bookmarks.len(), "bookmarks loaded");
                bookmarks
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "ignoring unreadable bookmark file");
                Vec::new()
            }
        }
    }

    /// Delete the scope's file. A missing file counts as success.
    pub fn clear(&self) -> bool {
        let path = self.path();
        match std::fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to remove bookmark file");
                false
            }
        }
    }
}

/// First 12 hex chars of the SHA-256 of the scope's storage key.
pub fn scope_hash(scope: &ProjectScope) -> String {
    let digest = Sha256::digest(scope.storage_key().as_bytes());
    hex::encode(digest)[..12].to_string()
}

/// Write via temp file + rename so readers never see a half-written file.
fn write_file(path: &Path, bookmarks: &[Bookmark]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(&StorageFile {
        version: FORMAT_VERSION,
        bookmarks,
    })
    .context("failed to encode bookmarks")?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path).context("failed to rename temp file")?;
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<Bookmark>> {
    let contents = std::fs::read_to_string(path).context("failed to read bookmark file")?;
    decode(&contents)
}

/// Decode a storage document. Invalid entries are skipped; anything wrong
/// with the envelope rejects the whole file.
pub fn decode(contents: &str) -> Result<Vec<Bookmark>> {
    let root: Value = serde_json::from_str(contents).context("invalid JSON")?;

    match root.get("version").and_then(Value::as_u64) {
        Some(FORMAT_VERSION) => {}
        Some(other) => bail!("unsupported version {other}"),
        None => bail!("missing version"),
    }

    let Some(entries) = root.get("bookmarks").and_then(Value::as_array) else {
        bail!("`bookmarks` is not an array");
    };

    let mut bookmarks = Vec::with_capacity(entries.len());
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        let bookmark: Bookmark = match serde_json::from_value(entry.clone()) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "skipping undecodable bookmark entry");
                continue;
            }
        };
        if let Err(reason) = bookmark.validate() {
            tracing::warn!(%reason, "skipping invalid bookmark entry");
            continue;
        }
        // Ids are unique; the first occurrence wins.
        if !seen.insert(bookmark.id.clone()) {
            tracing::warn!(id = %bookmark.id, "skipping duplicate bookmark id");
            continue;
        }
        bookmarks.push(bookmark);
    }
    Ok(bookmarks)
}
