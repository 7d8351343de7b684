pub mod add;
pub mod delete;
pub mod export;
pub mod list;
pub mod scope;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use linemark::bookmark::types::normalize_path;
use linemark::config::LinemarkConfig;
use linemark::host::{DocumentId, MemoryHost};
use linemark::Engine;

/// Engine for the scope of the current directory, backed by an in-memory host.
pub fn open_engine(config: &LinemarkConfig) -> Result<Engine<MemoryHost>> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    Ok(Engine::new(config, MemoryHost::new(), cwd))
}

/// Absolute, normalized form of a path given on the command line.
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    Ok(PathBuf::from(normalize_path(&path.to_string_lossy(), &cwd)))
}

/// Load `path` into the engine's host and restore its bookmarks onto it.
pub fn open_document(engine: &mut Engine<MemoryHost>, path: &Path) -> Result<DocumentId> {
    let doc = engine.host_mut().open_file(path)?;
    engine.restore_document(doc);
    Ok(doc)
}
