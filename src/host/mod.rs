//! Host editor capability.
//!
//! Everything the engine needs from the editor goes through
//! [`DocumentAnchorProvider`]: document facts, tracking anchors, gutter
//! markers, inline annotations, cursor, prompts and the jump list. The
//! engine never renders anything itself, so a headless implementation such
//! as [`MemoryHost`] can stand in for a real editor.

pub mod memory;

pub use memory::MemoryHost;

/// Identity of an open document in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

/// Opaque handle to a host position marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

/// What kind of document the host says this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentKind {
    /// A regular file-backed document.
    #[default]
    File,
    /// Help pages, terminals, scratch or plugin-owned documents.
    Special,
}

/// Facts used to decide whether bookmarks apply to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Absolute path, or empty for unnamed documents.
    pub path: String,
    pub kind: DocumentKind,
    pub modifiable: bool,
}

/// Glyph and highlight for the gutter marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStyle {
    pub text: String,
    pub highlight: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub document: DocumentId,
    /// 1-based.
    pub line: u32,
}

/// One row of the host jump list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpEntry {
    pub file: String,
    pub line: u32,
    pub text: String,
}

/// Capability interface over the host editor. Lines are 1-based throughout.
pub trait DocumentAnchorProvider {
    /// `None` when the document is not open.
    fn document_info(&self, doc: DocumentId) -> Option<DocumentInfo>;

    fn line_count(&self, doc: DocumentId) -> Option<u32>;

    fn open_documents(&self) -> Vec<DocumentId>;

    fn cursor(&self) -> Option<Cursor>;

    fn set_cursor(&mut self, doc: DocumentId, line: u32);

    /// Create a left-gravity anchor at the start of `line`. `None` if the
    /// document is gone or the line is out of range.
    fn create_tracking_anchor(&mut self, doc: DocumentId, line: u32) -> Option<AnchorId>;

    /// Current line of an anchor, or `None` if it no longer exists.
    fn anchor_line(&self, doc: DocumentId, anchor: AnchorId) -> Option<u32>;

    fn delete_anchor(&mut self, doc: DocumentId, anchor: AnchorId);

    /// Attach a gutter marker to a tracking anchor.
    fn place_marker(&mut self, doc: DocumentId, anchor: AnchorId, style: &MarkerStyle) -> bool;

    fn remove_marker(&mut self, doc: DocumentId, anchor: AnchorId);

    /// Render `text` after `line`. Returns the annotation's own anchor.
    fn create_annotation(
        &mut self,
        doc: DocumentId,
        line: u32,
        text: &str,
        highlight: &str,
    ) -> Option<AnchorId>;

    fn delete_annotation(&mut self, doc: DocumentId, annotation: AnchorId);

    /// Whether any of our anchors, markers or annotations exist in `doc`.
    fn has_visuals(&self, doc: DocumentId) -> bool;

    /// Remove every anchor, marker and annotation we own in `doc`.
    fn clear_visuals(&mut self, doc: DocumentId);

    /// Ask for a line of text. `None` means the user cancelled.
    fn prompt(&mut self, message: &str, default: Option<&str>) -> Option<String>;

    fn confirm(&mut self, message: &str) -> bool;

    fn set_jump_list(&mut self, entries: Vec<JumpEntry>);
}
