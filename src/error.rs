//! Errors surfaced to callers of the bookmark engine.
//!
//! Validation problems and rolled-back mutations come back as
//! [`BookmarkError`]. Persistence failures on their own never reach the
//! caller; they are logged and degrade to "nothing saved" / "nothing loaded".

use std::path::PathBuf;

/// Why a document was refused by the validity check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentRejection {
    #[error("document is not open")]
    Unknown,
    #[error("document has no file path")]
    NoPath,
    #[error("document is a special (non-file) document")]
    Special,
    #[error("document is not modifiable")]
    NotModifiable,
    #[error("path uses the non-file protocol {0}")]
    Protocol(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BookmarkError {
    #[error("invalid document: {0}")]
    InvalidDocument(#[from] DocumentRejection),

    #[error("no cursor position available")]
    NoCursor,

    #[error("file path must not be empty")]
    EmptyPath,

    #[error("line {line} is out of range for {file}")]
    LineOutOfRange { file: String, line: u32 },

    #[error("bookmark not found: {0}")]
    NotFound(String),

    #[error("failed to save bookmarks to {}", .0.display())]
    PersistFailed(PathBuf),
}

pub type BookmarkResult<T> = std::result::Result<T, BookmarkError>;
