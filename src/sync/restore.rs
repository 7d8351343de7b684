//! Restore, cleanup and strip of a document's bookmark visuals.

use crate::bookmark::BookmarkStore;
use crate::config::DisplayConfig;
use crate::error::DocumentRejection;
use crate::host::{DocumentAnchorProvider, DocumentId};

use super::{attach, detach, sync_lines, validate_document, EngineState};

/// What [`restore_document`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The document is not a real, editable file.
    Rejected(DocumentRejection),
    /// Already restored earlier in this session.
    AlreadyRestored,
    /// The document already carries our visuals.
    AlreadyMarked,
    Restored { restored: usize, failed: usize },
}

impl RestoreOutcome {
    /// `true` unless some bookmark failed to restore.
    pub fn is_clean(&self) -> bool {
        !matches!(self, Self::Restored { failed, .. } if *failed > 0)
    }
}

/// Recreate anchors, markers and annotations for every bookmark of `doc`.
///
/// Runs at most once per document per session. The restored set is checked
/// and updated before any work so a re-entrant call cannot draw twice.
pub fn restore_document<H: DocumentAnchorProvider>(
    state: &mut EngineState,
    store: &mut BookmarkStore,
    host: &mut H,
    display: &DisplayConfig,
    doc: DocumentId,
) -> RestoreOutcome {
    let path = match validate_document(host, doc) {
        Ok(path) => path,
        Err(reason) => {
            tracing::trace!(doc = doc.0, %reason, "not restoring document");
            return RestoreOutcome::Rejected(reason);
        }
    };

    if !state.mark_restored(doc, &path) {
        return RestoreOutcome::AlreadyRestored;
    }

    // Covers a reset restored set on a document that was never stripped.
    if host.has_visuals(doc) {
        tracing::debug!(doc = doc.0, path = %path, "document already has bookmark visuals");
        return RestoreOutcome::AlreadyMarked;
    }

    let show = state.annotations_visible;
    let mut restored = 0;
    let mut failed = 0;

    for id in store.ids_for_file(&path) {
        let Some(bookmark) = store.find_by_id_mut(&id) else {
            continue;
        };
        // Stale handles from an earlier load of this file.
        detach(host, doc, bookmark);
        match attach(host, doc, bookmark, display, show) {
            Ok(()) => restored += 1,
            Err(e) => {
                tracing::debug!(id = %id, error = %e, "skipping bookmark during restore");
                failed += 1;
            }
        }
    }

    if restored > 0 || failed > 0 {
        tracing::debug!(path = %path, restored, failed, "document bookmarks restored");
    }
    RestoreOutcome::Restored { restored, failed }
}

/// Forget `doc` when it closes so a reopen restores again.
///
/// Stored lines are refreshed from the anchors first, while they still exist.
pub fn cleanup_document<H: DocumentAnchorProvider>(
    state: &mut EngineState,
    store: &mut BookmarkStore,
    host: &H,
    doc: DocumentId,
) {
    let Some(path) = state.forget(doc) else {
        return;
    };
    if host.document_info(doc).is_some() {
        sync_lines(store, host, doc, &path);
    }
    for bookmark in store.raw_mut().iter_mut().filter(|b| b.file == path) {
        bookmark.tracking_anchor = None;
        bookmark.annotation_anchor = None;
    }
    tracing::trace!(doc = doc.0, path = %path, "document tracking cleaned up");
}

/// Remove all of our visuals from `doc` and drop the matching handles.
pub fn strip_document<H: DocumentAnchorProvider>(
    store: &mut BookmarkStore,
    host: &mut H,
    doc: DocumentId,
) {
    host.clear_visuals(doc);
    let Some(info) = host.document_info(doc) else {
        return;
    };
    for bookmark in store.raw_mut().iter_mut().filter(|b| b.file == info.path) {
        bookmark.tracking_anchor = None;
        bookmark.annotation_anchor = None;
    }
}
