pub mod scope;
pub mod storage;

pub use scope::{GitCli, ProjectScope, ScopeResolver, VcsProbe, DEFAULT_BRANCH};
pub use storage::{Storage, FORMAT_VERSION};
