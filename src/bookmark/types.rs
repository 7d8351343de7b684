//! Core bookmark type definitions.
//!
//! Defines [`Bookmark`] (a persisted file/line/note record with transient
//! anchor handles), id generation, and path normalization.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::host::AnchorId;

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A bookmark record, matching one entry of the storage file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Absolute, normalized path of the bookmarked file.
    pub file: String,
    /// 1-based line. Only authoritative while the document is not open.
    pub line: u32,
    /// Free-form note. `None` means the bookmark never shows an annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// 16 hex chars, immutable for the bookmark's lifetime.
    pub id: String,
    /// Host anchor following the line while the document is loaded.
    #[serde(skip)]
    pub tracking_anchor: Option<AnchorId>,
    /// Host anchor rendering the note, present only while it is shown.
    #[serde(skip)]
    pub annotation_anchor: Option<AnchorId>,
}

impl Bookmark {
    /// Create a bookmark with a freshly generated id.
    pub fn new(file: impl Into<String>, line: u32, note: Option<String>) -> Self {
        let file = file.into();
        let id = generate_id(&file, line);
        Self {
            file,
            line,
            note,
            id,
            tracking_anchor: None,
            annotation_anchor: None,
        }
    }

    pub fn has_note(&self) -> bool {
        self.note.is_some()
    }

    /// Check the persisted fields. Returns the reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("empty id".into());
        }
        if self.file.is_empty() {
            return Err(format!("bookmark {} has an empty file", self.id));
        }
        if self.line == 0 {
            return Err(format!("bookmark {} has line 0", self.id));
        }
        Ok(())
    }

    /// Copy without host handles. Used where anchors from a previous
    /// session must not leak, e.g. after a reload.
    pub fn detached(&self) -> Self {
        Self {
            tracking_anchor: None,
            annotation_anchor: None,
            ..self.clone()
        }
    }
}

/// Hash `file + line + timestamp` with SHA-256 and keep 16 hex chars.
pub fn generate_id(file: &str, line: u32) -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(file.as_bytes());
    hasher.update(line.to_string().as_bytes());
    hasher.update(nanos.to_string().as_bytes());
    hasher.update(seq.to_le_bytes());
    let hash = hasher.finalize();

    hex::encode(&hash[..8])
}

/// Make `path` absolute against `cwd` and resolve `.` and `..` lexically.
///
/// Symlinks are not followed: the file may not exist yet, and the editor
/// reports the path the user opened.
pub fn normalize_path(path: &str, cwd: &Path) -> String {
    if path.is_empty() {
        return String::new();
    }
    let raw = crate::config::expand_tilde(path);
    let joined = if raw.is_absolute() { raw } else { cwd.join(raw) };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out.to_string_lossy().into_owned()
}
