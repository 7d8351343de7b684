pub mod store;
pub mod types;

pub use store::{BookmarkStore, IndexEntry};
pub use types::Bookmark;
