//! Project scope detection.
//!
//! A scope is the `(root, branch)` pair that selects which bookmark file is
//! active. Git is queried through [`VcsProbe`]; results are kept in a single
//! last-result slot for [`VCS_CACHE_TTL`] so repeated lookups don't spawn a
//! subprocess each time.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// Branch used when no VCS information is available.
pub const DEFAULT_BRANCH: &str = "default";

pub const VCS_CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    pub root: PathBuf,
    pub branch: String,
}

impl ProjectScope {
    pub fn new(root: impl Into<PathBuf>, branch: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            branch: branch.into(),
        }
    }

    /// Scope for a directory outside any repository.
    pub fn fallback(cwd: &Path) -> Self {
        Self::new(cwd, DEFAULT_BRANCH)
    }

    /// `root|branch`, the input to the storage file hash.
    pub fn storage_key(&self) -> String {
        format!("{}|{}", self.root.display(), self.branch)
    }
}

impl std::fmt::Display for ProjectScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.root.display(), self.branch)
    }
}

/// Source of repository facts for a working directory.
pub trait VcsProbe {
    /// Top-level directory of the repository containing `cwd`.
    fn root(&self, cwd: &Path) -> Option<PathBuf>;
    /// Current branch name, or `None` when detached or unavailable.
    fn branch(&self, cwd: &Path) -> Option<String>;
    /// Abbreviated hash of `HEAD`.
    fn short_commit(&self, cwd: &Path) -> Option<String>;
}

/// [`VcsProbe`] backed by the `git` executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

impl GitCli {
    fn run(cwd: &Path, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| tracing::debug!(error = %e, "git not runnable"))
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

impl VcsProbe for GitCli {
    fn root(&self, cwd: &Path) -> Option<PathBuf> {
        Self::run(cwd, &["rev-parse", "--show-toplevel"]).map(PathBuf::from)
    }

    fn branch(&self, cwd: &Path) -> Option<String> {
        // `--abbrev-ref` prints the literal "HEAD" when detached.
        Self::run(cwd, &["rev-parse", "--abbrev-ref", "HEAD"]).filter(|b| b != "HEAD")
    }

    fn short_commit(&self, cwd: &Path) -> Option<String> {
        Self::run(cwd, &["rev-parse", "--short", "HEAD"])
    }
}

struct CachedScope {
    at: Instant,
    cwd: PathBuf,
    scope: ProjectScope,
}

/// Resolves the scope for a directory, caching the last answer.
pub struct ScopeResolver {
    probe: Box<dyn VcsProbe>,
    ttl: Duration,
    last: Option<CachedScope>,
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new(Box::new(GitCli))
    }
}

impl ScopeResolver {
    pub fn new(probe: Box<dyn VcsProbe>) -> Self {
        Self {
            probe,
            ttl: VCS_CACHE_TTL,
            last: None,
        }
    }

    /// Scope for `cwd` as of `now`. A cached result is reused while it is
    /// younger than the TTL and was computed for the same directory.
    pub fn resolve(&mut self, cwd: &Path, now: Instant) -> ProjectScope {
        if let Some(cached) = &self.last {
            if cached.cwd == cwd && now.saturating_duration_since(cached.at) < self.ttl {
                return cached.scope.clone();
            }
        }

        let scope = self.detect(cwd);
        tracing::debug!(scope = %scope, "project scope detected");
        self.last = Some(CachedScope {
            at: now,
            cwd: cwd.to_path_buf(),
            scope: scope.clone(),
        });
        scope
    }

    /// Forget the cached answer.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    fn detect(&self, cwd: &Path) -> ProjectScope {
        let Some(root) = self.probe.root(cwd) else {
            return ProjectScope::fallback(cwd);
        };
        let branch = self
            .probe
            .branch(cwd)
            .or_else(|| self.probe.short_commit(cwd))
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        ProjectScope::new(root, branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeProbe {
        root: Option<&'static str>,
        branch: Option<&'static str>,
        commit: Option<&'static str>,
        calls: Rc<Cell<u32>>,
    }

    impl VcsProbe for FakeProbe {
        fn root(&self, _cwd: &Path) -> Option<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            self.root.map(PathBuf::from)
        }
        fn branch(&self, _cwd: &Path) -> Option<String> {
            self.branch.map(String::from)
        }
        fn short_commit(&self, _cwd: &Path) -> Option<String> {
            self.commit.map(String::from)
        }
    }

    fn resolver(
        root: Option<&'static str>,
        branch: Option<&'static str>,
        commit: Option<&'static str>,
    ) -> (ScopeResolver, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let probe = FakeProbe {
            root,
            branch,
            commit,
            calls: Rc::clone(&calls),
        };
        (ScopeResolver::new(Box::new(probe)), calls)
    }

    #[test]
    fn branch_scope_inside_repository() {
        let (mut r, _) = resolver(Some("/repo"), Some("main"), Some("abc1234"));
        let scope = r.resolve(Path::new("/repo/src"), Instant::now());
        assert_eq!(scope, ProjectScope::new("/repo", "main"));
        assert_eq!(scope.storage_key(), "/repo|main");
    }

    #[test]
    fn detached_head_uses_short_commit() {
        let (mut r, _) = resolver(Some("/repo"), None, Some("abc1234"));
        let scope = r.resolve(Path::new("/repo"), Instant::now());
        assert_eq!(scope.branch, "abc1234");
    }

    #[test]
    fn no_repository_falls_back_to_cwd() {
        let (mut r, _) = resolver(None, None, None);
        let scope = r.resolve(Path::new("/tmp/scratch"), Instant::now());
        assert_eq!(scope, ProjectScope::new("/tmp/scratch", DEFAULT_BRANCH));
    }

    #[test]
    fn cache_expires_after_ttl() {
        let (mut r, calls) = resolver(Some("/repo"), Some("main"), None);
        let t0 = Instant::now();
        let cwd = Path::new("/repo");

        r.resolve(cwd, t0);
        r.resolve(cwd, t0 + Duration::from_secs(4));
        assert_eq!(calls.get(), 1);

        r.resolve(cwd, t0 + Duration::from_secs(6));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn cache_is_a_single_slot() {
        let (mut r, calls) = resolver(Some("/repo"), Some("main"), None);
        let now = Instant::now();
        r.resolve(Path::new("/a"), now);
        r.resolve(Path::new("/b"), now);
        r.resolve(Path::new("/a"), now);
        assert_eq!(calls.get(), 3);

        r.invalidate();
        r.resolve(Path::new("/a"), now);
        assert_eq!(calls.get(), 4);
    }
}
