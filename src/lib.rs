//! Line bookmarks with notes that stay put while files are edited.
//!
//! linemark keeps a set of `(file, line, note)` bookmarks per project scope,
//! where a scope is the repository root plus the checked-out branch (or a
//! short commit hash when detached). While a file is open in the editor each
//! bookmark is bound to a tracking anchor, so its line follows insertions and
//! deletions above it; the updated position is written back on save.
//!
//! # Architecture
//!
//! - **Storage**: one versioned JSON file per scope, named by a truncated
//!   SHA-256 of `root|branch`
//! - **Index**: flat bookmark list plus a per-file, line-sorted index for
//!   navigation without sorting at query time
//! - **Sync**: idempotent restore of gutter markers and inline annotations
//!   through a host capability trait
//! - **Orchestration**: create/update/delete with rollback when a save fails
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`bookmark`]: Bookmark model and the indexed in-memory store
//! - [`persistence`]: Project scope detection and versioned storage
//! - [`host`]: Editor capability trait and the in-memory host
//! - [`sync`]: Tracking anchors, restore, and annotation visibility
//! - [`engine`]: User-facing operations over all of the above

pub mod bookmark;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod persistence;
pub mod schedule;
pub mod sync;

pub use bookmark::{Bookmark, BookmarkStore};
pub use engine::{AnnotateOutcome, ClearOutcome, Engine, Navigation, ToggleOutcome};
pub use error::{BookmarkError, BookmarkResult};
