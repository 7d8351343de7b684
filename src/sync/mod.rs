//! Position tracking and visual sync.
//!
//! Bookmarks in an open document carry a tracking anchor; the anchor, not the
//! stored line, is the truth while the document is loaded. This module owns
//! creating and destroying those anchors together with their gutter markers
//! and inline annotations, and refreshing stored lines from anchors.

pub mod restore;
pub mod toggle;

use std::collections::HashMap;

use crate::bookmark::{Bookmark, BookmarkStore};
use crate::config::DisplayConfig;
use crate::error::{BookmarkError, BookmarkResult, DocumentRejection};
use crate::host::{DocumentAnchorProvider, DocumentId, DocumentKind, MarkerStyle};

pub use restore::{cleanup_document, restore_document, strip_document, RestoreOutcome};
pub use toggle::{toggle_all_annotations, toggle_annotation};

/// Path prefixes of documents that are not files on disk.
const NON_FILE_PROTOCOLS: &[&str] = &[
    "term://",
    "fugitive://",
    "oil://",
    "diffview://",
    "gitsigns://",
    "zipfile://",
    "scp://",
    "http://",
    "https://",
];

/// Process-wide sync state, passed explicitly instead of living in globals.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub annotations_visible: bool,
    pub autosave_configured: bool,
    /// Documents already restored in this session, with the path they had.
    restored: HashMap<DocumentId, String>,
}

impl EngineState {
    pub fn new(annotations_visible: bool, autosave_configured: bool) -> Self {
        Self {
            annotations_visible,
            autosave_configured,
            restored: HashMap::new(),
        }
    }

    pub fn is_restored(&self, doc: DocumentId) -> bool {
        self.restored.contains_key(&doc)
    }

    /// Record `doc` as restored. Returns `false` if it already was.
    fn mark_restored(&mut self, doc: DocumentId, path: &str) -> bool {
        if self.restored.contains_key(&doc) {
            return false;
        }
        self.restored.insert(doc, path.to_string());
        true
    }

    /// Restored document currently showing `file`.
    fn restored_document(&self, file: &str) -> Option<DocumentId> {
        self.restored
            .iter()
            .find(|(_, path)| path.as_str() == file)
            .map(|(doc, _)| *doc)
    }

    fn forget(&mut self, doc: DocumentId) -> Option<String> {
        self.restored.remove(&doc)
    }

    /// Forget every restored document so all of them sync again.
    pub fn reset(&mut self) {
        self.restored.clear();
    }
}

/// Accept only real, editable, on-disk documents. Returns the path.
pub fn validate_document<H: DocumentAnchorProvider>(
    host: &H,
    doc: DocumentId,
) -> Result<String, DocumentRejection> {
    let info = host.document_info(doc).ok_or(DocumentRejection::Unknown)?;
    if info.path.is_empty() {
        return Err(DocumentRejection::NoPath);
    }
    if info.kind == DocumentKind::Special {
        return Err(DocumentRejection::Special);
    }
    if !info.modifiable {
        return Err(DocumentRejection::NotModifiable);
    }
    if let Some(protocol) = NON_FILE_PROTOCOLS.iter().find(|p| info.path.starts_with(*p)) {
        return Err(DocumentRejection::Protocol(protocol.to_string()));
    }
    Ok(info.path)
}

/// Open document showing `file`, if any.
pub fn document_for_file<H: DocumentAnchorProvider>(host: &H, file: &str) -> Option<DocumentId> {
    host.open_documents()
        .into_iter()
        .find(|doc| host.document_info(*doc).is_some_and(|info| info.path == file))
}

/// Line from the tracking anchor, or `None` if there is none or it is gone.
pub fn effective_line<H: DocumentAnchorProvider>(
    host: &H,
    doc: DocumentId,
    bookmark: &Bookmark,
) -> Option<u32> {
    host.anchor_line(doc, bookmark.tracking_anchor?)
}

/// Anchor line with a best-effort fallback to the stored line.
pub fn resolved_line<H: DocumentAnchorProvider>(
    host: &H,
    doc: DocumentId,
    bookmark: &Bookmark,
) -> u32 {
    effective_line(host, doc, bookmark).unwrap_or(bookmark.line)
}

pub fn marker_style(display: &DisplayConfig) -> MarkerStyle {
    MarkerStyle {
        text: display.sign_text.clone(),
        highlight: display.sign_hl.clone(),
    }
}

pub fn annotation_text(display: &DisplayConfig, note: &str) -> String {
    format!("{}{}", display.annotation_prefix, note)
}

/// Create the tracking anchor and marker for `bookmark` at its stored line,
/// plus the annotation when it has a note and `show_annotation` is set.
pub fn attach<H: DocumentAnchorProvider>(
    host: &mut H,
    doc: DocumentId,
    bookmark: &mut Bookmark,
    display: &DisplayConfig,
    show_annotation: bool,
) -> BookmarkResult<()> {
    let anchor = host
        .create_tracking_anchor(doc, bookmark.line)
        .ok_or_else(|| BookmarkError::LineOutOfRange {
            file: bookmark.file.clone(),
            line: bookmark.line,
        })?;
    bookmark.tracking_anchor = Some(anchor);

    if !host.place_marker(doc, anchor, &marker_style(display)) {
        tracing::debug!(id = %bookmark.id, "gutter marker not placed");
    }

    if show_annotation {
        if let Some(note) = &bookmark.note {
            bookmark.annotation_anchor = host.create_annotation(
                doc,
                bookmark.line,
                &annotation_text(display, note),
                &display.annotation_hl,
            );
        }
    }
    Ok(())
}

/// Destroy every visual tied to `bookmark` and clear its handles.
pub fn detach<H: DocumentAnchorProvider>(host: &mut H, doc: DocumentId, bookmark: &mut Bookmark) {
    if let Some(annotation) = bookmark.annotation_anchor.take() {
        host.delete_annotation(doc, annotation);
    }
    if let Some(anchor) = bookmark.tracking_anchor.take() {
        host.remove_marker(doc, anchor);
        host.delete_anchor(doc, anchor);
    }
}

/// Copy anchor lines into the stored `line` of every bookmark in `file`,
/// then re-sort that file's index. Returns whether anything moved.
pub fn sync_lines<H: DocumentAnchorProvider>(
    store: &mut BookmarkStore,
    host: &H,
    doc: DocumentId,
    file: &str,
) -> bool {
    let mut moved = false;
    for bookmark in store.raw_mut().iter_mut().filter(|b| b.file == file) {
        if let Some(line) = effective_line(host, doc, bookmark) {
            if line != bookmark.line {
                tracing::trace!(id = %bookmark.id, from = bookmark.line, to = line, "bookmark moved");
                bookmark.line = line;
                moved = true;
            }
        }
    }
    if moved {
        store.reindex_file(file);
    }
    moved
}

/// [`sync_lines`] for every restored document.
pub fn sync_all_lines<H: DocumentAnchorProvider>(
    state: &EngineState,
    store: &mut BookmarkStore,
    host: &H,
) {
    for (doc, path) in &state.restored {
        if host.document_info(*doc).is_some() {
            sync_lines(store, host, *doc, path);
        }
    }
}
