//! Showing and hiding inline annotations.

use crate::bookmark::{Bookmark, BookmarkStore};
use crate::config::DisplayConfig;
use crate::host::{DocumentAnchorProvider, DocumentId};

use super::{annotation_text, resolved_line, EngineState};

/// Flip the annotation of a single bookmark. Note-less bookmarks are left
/// alone. Returns whether the annotation is now shown.
pub fn toggle_annotation<H: DocumentAnchorProvider>(
    host: &mut H,
    display: &DisplayConfig,
    doc: DocumentId,
    bookmark: &mut Bookmark,
) -> bool {
    let Some(note) = bookmark.note.clone() else {
        return false;
    };
    if let Some(annotation) = bookmark.annotation_anchor.take() {
        host.delete_annotation(doc, annotation);
        return false;
    }
    let line = resolved_line(host, doc, bookmark);
    bookmark.annotation_anchor = host.create_annotation(
        doc,
        line,
        &annotation_text(display, &note),
        &display.annotation_hl,
    );
    bookmark.annotation_anchor.is_some()
}

/// Flip global annotation visibility and bring every open document in line
/// with it. Repeated calls never stack annotations.
pub fn toggle_all_annotations<H: DocumentAnchorProvider>(
    state: &mut EngineState,
    store: &mut BookmarkStore,
    host: &mut H,
    display: &DisplayConfig,
) -> bool {
    state.annotations_visible = !state.annotations_visible;
    let visible = state.annotations_visible;

    for bookmark in store.raw_mut().iter_mut() {
        let Some(note) = bookmark.note.clone() else {
            continue;
        };
        // Documents never restored (or rejected) carry no visuals of ours.
        let Some(doc) = state
            .restored_document(&bookmark.file)
            .filter(|doc| host.document_info(*doc).is_some())
        else {
            continue;
        };
        let line = resolved_line(host, doc, bookmark);
        let line_count = host.line_count(doc).unwrap_or(0);
        if line == 0 || line > line_count {
            continue;
        }

        let current = bookmark
            .annotation_anchor
            .and_then(|annotation| host.anchor_line(doc, annotation));

        if visible {
            if current == Some(line) {
                continue;
            }
            // Missing, or left behind on another line: redraw.
            if let Some(stale) = bookmark.annotation_anchor.take() {
                host.delete_annotation(doc, stale);
            }
            bookmark.annotation_anchor = host.create_annotation(
                doc,
                line,
                &annotation_text(display, &note),
                &display.annotation_hl,
            );
        } else if let Some(annotation) = bookmark.annotation_anchor.take() {
            host.delete_annotation(doc, annotation);
        }
    }

    tracing::debug!(visible, "annotation visibility toggled");
    visible
}
