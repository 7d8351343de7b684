#![allow(dead_code)]

use std::path::{Path, PathBuf};

use linemark::config::LinemarkConfig;
use linemark::host::{DocumentAnchorProvider, DocumentId, MemoryHost};
use linemark::persistence::{ProjectScope, ScopeResolver, VcsProbe};
use linemark::Engine;
use tempfile::TempDir;

/// Probe that reports a fixed repository and branch for any directory.
pub struct FixedRepo {
    pub root: &'static str,
    pub branch: &'static str,
}

impl VcsProbe for FixedRepo {
    fn root(&self, _cwd: &Path) -> Option<PathBuf> {
        Some(PathBuf::from(self.root))
    }
    fn branch(&self, _cwd: &Path) -> Option<String> {
        Some(self.branch.to_string())
    }
    fn short_commit(&self, _cwd: &Path) -> Option<String> {
        None
    }
}

pub const REPO: &str = "/work/repo";

pub fn scope(branch: &str) -> ProjectScope {
    ProjectScope::new(REPO, branch)
}

/// Config writing into `data_dir`, with autosave on and annotations shown.
pub fn test_config(data_dir: &Path) -> LinemarkConfig {
    let mut config = LinemarkConfig::default();
    config.storage.data_dir = Some(data_dir.to_string_lossy().into_owned());
    config
}

/// Fresh engine on branch `main` of [`REPO`], storing under a temp dir.
pub fn test_engine(tmp: &TempDir) -> Engine<MemoryHost> {
    engine_with(test_config(tmp.path()))
}

pub fn engine_with(config: LinemarkConfig) -> Engine<MemoryHost> {
    let resolver = ScopeResolver::new(Box::new(FixedRepo {
        root: REPO,
        branch: "main",
    }));
    Engine::with_resolver(&config, MemoryHost::new(), REPO, resolver)
}

/// `n` lines of filler text.
pub fn text(n: u32) -> String {
    (1..=n).map(|i| format!("line {i}\n")).collect()
}

/// Open `path` with `n` lines and restore it, like an editor would on load.
pub fn open(engine: &mut Engine<MemoryHost>, path: &str, n: u32) -> DocumentId {
    let doc = engine.host_mut().open(path, &text(n));
    engine.restore_document(doc);
    doc
}

pub fn at(engine: &mut Engine<MemoryHost>, doc: DocumentId, line: u32) {
    engine.host_mut().set_cursor(doc, line);
}

/// Make the next save fail: the storage file becomes a directory, so the
/// final rename cannot replace it.
pub fn break_storage(engine: &mut Engine<MemoryHost>) -> PathBuf {
    let path = engine.storage_path();
    let _ = std::fs::remove_file(&path);
    std::fs::create_dir_all(&path).unwrap();
    path
}

pub fn repair_storage(path: &Path) {
    std::fs::remove_dir_all(path).unwrap();
}

pub fn cursor_line(engine: &Engine<MemoryHost>) -> Option<u32> {
    engine.host().cursor().map(|c| c.line)
}
