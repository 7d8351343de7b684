//! Orchestration of store, persistence and visual sync.
//!
//! [`Engine`] is what the editor integration talks to. Every mutation follows
//! the same shape: change visuals and the store, save the full set, and undo
//! both if the save fails. The engine is driven from the host's event loop
//! and takes `&mut self` everywhere, so operations never interleave.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::bookmark::types::normalize_path;
use crate::bookmark::{Bookmark, BookmarkStore};
use crate::config::{default_data_dir, DisplayConfig, LinemarkConfig};
use crate::error::{BookmarkError, BookmarkResult};
use crate::host::{DocumentAnchorProvider, DocumentId, JumpEntry};
use crate::persistence::{ProjectScope, ScopeResolver, Storage};
use crate::schedule::SingleSlotTimer;
use crate::sync::{self, EngineState, RestoreOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotateOutcome {
    Created { id: String },
    Updated { id: String },
    /// Empty or cancelled input. Nothing changed.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added { id: String },
    Removed { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared(usize),
    NothingToClear,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Jumped { id: String, line: u32 },
    NoBookmarks,
}

/// Cursor position resolved against a valid document.
struct Target {
    doc: DocumentId,
    path: String,
    line: u32,
}

pub struct Engine<H: DocumentAnchorProvider> {
    host: H,
    display: DisplayConfig,
    autosave_delay: Duration,
    state: EngineState,
    store: BookmarkStore,
    storage: Storage,
    resolver: ScopeResolver,
    cwd: PathBuf,
    autosave: SingleSlotTimer<()>,
    pending_data_dir: SingleSlotTimer<String>,
}

impl<H: DocumentAnchorProvider> Engine<H> {
    /// Engine for `cwd`, detecting the scope with `git`.
    pub fn new(config: &LinemarkConfig, host: H, cwd: impl Into<PathBuf>) -> Self {
        Self::with_resolver(config, host, cwd, ScopeResolver::default())
    }

    pub fn with_resolver(
        config: &LinemarkConfig,
        host: H,
        cwd: impl Into<PathBuf>,
        mut resolver: ScopeResolver,
    ) -> Self {
        let cwd = cwd.into();
        let now = Instant::now();
        let scope = resolver.resolve(&cwd, now);

        let mut pending_data_dir = SingleSlotTimer::new();
        if let Some(dir) = &config.storage.data_dir {
            // Applied on the next tick, or before the first load at the latest.
            pending_data_dir.schedule(now, Duration::ZERO, dir.clone());
        }

        tracing::info!(scope = %scope, "bookmark engine ready");
        Self {
            host,
            display: config.display.clone(),
            autosave_delay: Duration::from_millis(config.autosave.delay_ms),
            state: EngineState::new(config.display.show_annotations, config.autosave.enabled),
            store: BookmarkStore::new(),
            storage: Storage::new(default_data_dir(), scope),
            resolver,
            cwd,
            autosave: SingleSlotTimer::new(),
            pending_data_dir,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn scope(&self) -> &ProjectScope {
        self.storage.scope()
    }

    pub fn storage_path(&mut self) -> PathBuf {
        self.apply_pending_config();
        self.storage.path()
    }

    // -- loading & saving ---------------------------------------------------

    fn apply_pending_config(&mut self) {
        if let Some(dir) = self.pending_data_dir.cancel() {
            self.apply_data_dir(&dir);
        }
    }

    fn apply_data_dir(&mut self, dir: &str) {
        let loaded = self.store.is_loaded();
        // Tracked positions belong to the old directory.
        if loaded && !self.persist() {
            tracing::warn!(data_dir = %self.storage.data_dir().display(), "could not save before changing data directory");
        }
        self.storage.set_data_dir(dir);
        if loaded {
            self.resync_all();
        }
    }

    /// Override the data directory. Takes effect on the next tick.
    pub fn set_data_dir(&mut self, dir: &str, now: Instant) {
        self.pending_data_dir
            .schedule(now, Duration::ZERO, dir.to_string());
    }

    fn ensure_loaded(&mut self) {
        self.apply_pending_config();
        let storage = &self.storage;
        self.store.ensure_loaded(|| storage.load());
    }

    /// Refresh stored lines from anchors and write the full set.
    fn persist(&mut self) -> bool {
        sync::sync_all_lines(&self.state, &mut self.store, &self.host);
        self.storage.save(self.store.as_slice())
    }

    /// Save now. Returns `false` if the write failed.
    pub fn save(&mut self) -> bool {
        self.ensure_loaded();
        self.persist()
    }

    /// Re-read the current scope from disk and redraw every open document.
    pub fn load(&mut self) {
        self.apply_pending_config();
        self.resync_all();
    }

    /// Strip, reset, reload and restore. The common tail of scope switches.
    fn resync_all(&mut self) {
        let documents = self.host.open_documents();
        for doc in &documents {
            sync::strip_document(&mut self.store, &mut self.host, *doc);
        }
        self.state.reset();

        let storage = &self.storage;
        self.store.reload(|| storage.load());

        for doc in documents {
            let outcome = self.restore_document(doc);
            if !outcome.is_clean() {
                tracing::debug!(doc = doc.0, ?outcome, "document restored with failures");
            }
        }
    }

    // -- collaborator queries -----------------------------------------------

    /// Independent copy of every bookmark in the active scope.
    pub fn get_all(&mut self) -> Vec<Bookmark> {
        self.ensure_loaded();
        self.store.get_all()
    }

    pub fn has_bookmarks(&mut self) -> bool {
        self.ensure_loaded();
        !self.store.is_empty()
    }

    /// Bookmarks of `file` in line order.
    pub fn bookmarks_for_file(&mut self, file: &str) -> Vec<Bookmark> {
        self.ensure_loaded();
        let file = normalize_path(file, &self.cwd);
        if let Some(doc) = sync::document_for_file(&self.host, &file) {
            sync::sync_lines(&mut self.store, &self.host, doc, &file);
        }
        self.store
            .ids_for_file(&file)
            .iter()
            .filter_map(|id| self.store.find_by_id(id).cloned())
            .collect()
    }

    // -- document lifecycle -------------------------------------------------

    /// Draw bookmarks for a freshly opened document.
    pub fn restore_document(&mut self, doc: DocumentId) -> RestoreOutcome {
        self.ensure_loaded();
        sync::restore_document(
            &mut self.state,
            &mut self.store,
            &mut self.host,
            &self.display,
            doc,
        )
    }

    /// Call before a document closes.
    pub fn cleanup_document(&mut self, doc: DocumentId) {
        sync::cleanup_document(&mut self.state, &mut self.store, &self.host, doc);
    }

    // -- create / update ----------------------------------------------------

    fn cursor_target(&mut self) -> BookmarkResult<Target> {
        let cursor = self.host.cursor().ok_or(BookmarkError::NoCursor)?;
        let path = sync::validate_document(&self.host, cursor.document)?;
        self.ensure_loaded();
        self.restore_document(cursor.document);
        sync::sync_lines(&mut self.store, &self.host, cursor.document, &path);
        Ok(Target {
            doc: cursor.document,
            path,
            line: cursor.line,
        })
    }

    /// Set the note of the bookmark under the cursor, creating the bookmark
    /// if there is none. `text` skips the prompt.
    pub fn annotate(&mut self, text: Option<&str>) -> BookmarkResult<AnnotateOutcome> {
        let target = self.cursor_target()?;
        let existing = self
            .store
            .find_at_line(&target.path, target.line)
            .map(|b| (b.id.clone(), b.note.clone()));

        let note = match text {
            Some(text) => text.to_string(),
            None => {
                let default = existing.as_ref().and_then(|(_, note)| note.as_deref());
                match self.host.prompt("Bookmark note: ", default) {
                    Some(answer) => answer,
                    None => return Ok(AnnotateOutcome::Cancelled),
                }
            }
        };
        if note.trim().is_empty() {
            return Ok(AnnotateOutcome::Cancelled);
        }

        match existing {
            Some((id, old_note)) => self.update_note(target.doc, &id, old_note, note),
            None => self
                .create(target.doc, &target.path, target.line, Some(note))
                .map(|id| AnnotateOutcome::Created { id }),
        }
    }

    /// Add a note-less bookmark at the cursor, or remove the one there.
    pub fn toggle(&mut self) -> BookmarkResult<ToggleOutcome> {
        let target = self.cursor_target()?;
        match self.store.find_at_line(&target.path, target.line) {
            Some(existing) => {
                let id = existing.id.clone();
                self.delete_by_id(&id)?;
                Ok(ToggleOutcome::Removed { id })
            }
            None => self
                .create(target.doc, &target.path, target.line, None)
                .map(|id| ToggleOutcome::Added { id }),
        }
    }

    fn create(
        &mut self,
        doc: DocumentId,
        path: &str,
        line: u32,
        note: Option<String>,
    ) -> BookmarkResult<String> {
        if path.is_empty() {
            return Err(BookmarkError::EmptyPath);
        }
        let mut bookmark = Bookmark::new(path, line, note);
        sync::attach(
            &mut self.host,
            doc,
            &mut bookmark,
            &self.display,
            self.state.annotations_visible,
        )?;
        let id = bookmark.id.clone();
        self.store.add(bookmark);

        if !self.persist() {
            if let Some(mut bookmark) = self.store.remove(&id) {
                sync::detach(&mut self.host, doc, &mut bookmark);
            }
            return Err(BookmarkError::PersistFailed(self.storage.path()));
        }
        tracing::info!(id = %id, file = %path, line, "bookmark created");
        Ok(id)
    }

    fn update_note(
        &mut self,
        doc: DocumentId,
        id: &str,
        old_note: Option<String>,
        new_note: String,
    ) -> BookmarkResult<AnnotateOutcome> {
        let visible = self.state.annotations_visible;
        let display = &self.display;
        let host = &mut self.host;
        let bookmark = self
            .store
            .find_by_id_mut(id)
            .ok_or_else(|| BookmarkError::NotFound(id.to_string()))?;

        let line = sync::resolved_line(host, doc, bookmark);
        let old_annotation = bookmark.annotation_anchor.take();
        let new_annotation = if visible || old_annotation.is_some() {
            host.create_annotation(
                doc,
                line,
                &sync::annotation_text(display, &new_note),
                &display.annotation_hl,
            )
        } else {
            None
        };
        if let Some(annotation) = old_annotation {
            host.delete_annotation(doc, annotation);
        }
        bookmark.note = Some(new_note);
        bookmark.annotation_anchor = new_annotation;

        if self.persist() {
            tracing::info!(id = %id, "bookmark note updated");
            return Ok(AnnotateOutcome::Updated { id: id.to_string() });
        }

        // Put the old note and its annotation back exactly as they were.
        if let Some(annotation) = new_annotation {
            self.host.delete_annotation(doc, annotation);
        }
        let restored_annotation = match (&old_note, old_annotation) {
            (Some(note), Some(_)) => self.host.create_annotation(
                doc,
                line,
                &sync::annotation_text(&self.display, note),
                &self.display.annotation_hl,
            ),
            _ => None,
        };
        if let Some(bookmark) = self.store.find_by_id_mut(id) {
            bookmark.note = old_note;
            bookmark.annotation_anchor = restored_annotation;
        }
        Err(BookmarkError::PersistFailed(self.storage.path()))
    }

    // -- delete -------------------------------------------------------------

    /// Remove visuals and store entries for `ids`, in that order. Returns the
    /// removed bookmarks.
    fn take_bookmarks(&mut self, ids: &[String]) -> Vec<Bookmark> {
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(bookmark) = self.store.find_by_id_mut(id) else {
                continue;
            };
            if let Some(doc) = sync::document_for_file(&self.host, &bookmark.file) {
                // Capture the live position before the anchor goes away.
                if let Some(line) = sync::effective_line(&self.host, doc, bookmark) {
                    bookmark.line = line;
                }
                sync::detach(&mut self.host, doc, bookmark);
            }
            if let Some(bookmark) = self.store.remove(id) {
                removed.push(bookmark);
            }
        }
        removed
    }

    /// Undo [`take_bookmarks`](Self::take_bookmarks) after a failed save.
    fn reinstate(&mut self, bookmarks: Vec<Bookmark>) {
        for mut bookmark in bookmarks {
            if let Some(doc) = sync::document_for_file(&self.host, &bookmark.file) {
                if self.state.is_restored(doc) {
                    if let Err(e) = sync::attach(
                        &mut self.host,
                        doc,
                        &mut bookmark,
                        &self.display,
                        self.state.annotations_visible,
                    ) {
                        tracing::debug!(id = %bookmark.id, error = %e, "could not redraw reinstated bookmark");
                    }
                }
            }
            self.store.add(bookmark);
        }
    }

    fn delete_ids(&mut self, ids: &[String]) -> BookmarkResult<Vec<Bookmark>> {
        let removed = self.take_bookmarks(ids);
        if !self.persist() {
            self.reinstate(removed);
            return Err(BookmarkError::PersistFailed(self.storage.path()));
        }
        Ok(removed)
    }

    /// Delete the bookmark under the cursor.
    pub fn delete_at_cursor(&mut self) -> BookmarkResult<Bookmark> {
        let target = self.cursor_target()?;
        let id = self
            .store
            .find_at_line(&target.path, target.line)
            .map(|b| b.id.clone())
            .ok_or_else(|| {
                BookmarkError::NotFound(format!("{}:{}", target.path, target.line))
            })?;
        self.delete_by_id(&id)
    }

    pub fn delete_by_id(&mut self, id: &str) -> BookmarkResult<Bookmark> {
        self.ensure_loaded();
        if self.store.find_by_id(id).is_none() {
            return Err(BookmarkError::NotFound(id.to_string()));
        }
        let mut removed = self.delete_ids(&[id.to_string()])?;
        tracing::info!(id = %id, "bookmark deleted");
        removed
            .pop()
            .ok_or_else(|| BookmarkError::NotFound(id.to_string()))
    }

    /// Delete every bookmark in `file`. Returns how many were removed.
    pub fn delete_for_file(&mut self, file: &str) -> BookmarkResult<usize> {
        if file.is_empty() {
            return Err(BookmarkError::EmptyPath);
        }
        self.ensure_loaded();
        let file = normalize_path(file, &self.cwd);
        let ids = self.store.ids_for_file(&file);
        if ids.is_empty() {
            return Ok(0);
        }
        let removed = self.delete_ids(&ids)?;
        tracing::info!(file = %file, count = removed.len(), "bookmarks deleted for file");
        Ok(removed.len())
    }

    /// Delete everything in the active scope after the host confirms.
    pub fn clear_all(&mut self) -> BookmarkResult<ClearOutcome> {
        self.ensure_loaded();
        if self.store.is_empty() {
            return Ok(ClearOutcome::NothingToClear);
        }
        let prompt = format!("Delete all {} bookmarks?", self.store.len());
        if !self.host.confirm(&prompt) {
            return Ok(ClearOutcome::Declined);
        }
        let ids: Vec<String> = self.store.iter().map(|b| b.id.clone()).collect();
        let removed = self.delete_ids(&ids)?;
        tracing::info!(count = removed.len(), "all bookmarks cleared");
        Ok(ClearOutcome::Cleared(removed.len()))
    }

    // -- scope --------------------------------------------------------------

    /// Switch to `scope`, or to the scope detected from the working
    /// directory when `None`.
    pub fn change_scope(&mut self, scope: Option<ProjectScope>) {
        let target = scope.unwrap_or_else(|| self.resolver.resolve(&self.cwd, Instant::now()));
        self.apply_pending_config();

        if self.store.is_loaded() && !self.persist() {
            tracing::warn!(scope = %self.storage.scope(), "could not save before switching scope");
        }
        // The pending save belonged to the old scope and was just covered.
        self.autosave.cancel();

        tracing::info!(from = %self.storage.scope(), to = %target, "switching bookmark scope");
        self.storage.set_scope(target);
        self.resync_all();
    }

    /// Re-detect the scope for `cwd` and switch if it changed, e.g. after a
    /// directory change or a branch checkout.
    pub fn refresh_scope(&mut self, cwd: &Path, now: Instant) -> bool {
        self.cwd = cwd.to_path_buf();
        let detected = self.resolver.resolve(cwd, now);
        if &detected == self.storage.scope() {
            return false;
        }
        self.change_scope(Some(detected));
        true
    }

    // -- navigation ---------------------------------------------------------

    pub fn next(&mut self) -> BookmarkResult<Navigation> {
        self.navigate(true)
    }

    pub fn prev(&mut self) -> BookmarkResult<Navigation> {
        self.navigate(false)
    }

    fn navigate(&mut self, forward: bool) -> BookmarkResult<Navigation> {
        let target = self.cursor_target()?;
        let entries = self.store.sorted_for_file(&target.path);

        let found = match entries {
            [] => return Ok(Navigation::NoBookmarks),
            [only] => only,
            [first, .., last] => {
                if forward {
                    entries.iter().find(|e| e.line > target.line).unwrap_or(first)
                } else {
                    entries
                        .iter()
                        .rev()
                        .find(|e| e.line < target.line)
                        .unwrap_or(last)
                }
            }
        };
        let (id, line) = (found.id.clone(), found.line);

        self.host.set_cursor(target.doc, line);
        Ok(Navigation::Jumped { id, line })
    }

    // -- annotations --------------------------------------------------------

    /// Show or hide the note of the bookmark under the cursor.
    pub fn toggle_annotation(&mut self) -> BookmarkResult<bool> {
        let target = self.cursor_target()?;
        let id = self
            .store
            .find_at_line(&target.path, target.line)
            .map(|b| b.id.clone())
            .ok_or_else(|| {
                BookmarkError::NotFound(format!("{}:{}", target.path, target.line))
            })?;
        let display = &self.display;
        let host = &mut self.host;
        let Some(bookmark) = self.store.find_by_id_mut(&id) else {
            return Err(BookmarkError::NotFound(id));
        };
        Ok(sync::toggle_annotation(host, display, target.doc, bookmark))
    }

    /// Flip global annotation visibility. Returns the new state.
    pub fn toggle_all_annotations(&mut self) -> bool {
        self.ensure_loaded();
        sync::toggle_all_annotations(
            &mut self.state,
            &mut self.store,
            &mut self.host,
            &self.display,
        )
    }

    // -- jump list ----------------------------------------------------------

    /// Fill the host jump list with every bookmark, by file then line.
    pub fn send_to_jump_list(&mut self) -> usize {
        self.ensure_loaded();
        sync::sync_all_lines(&self.state, &mut self.store, &self.host);
        let entries: Vec<JumpEntry> = self
            .store
            .files()
            .iter()
            .flat_map(|file| self.store.ids_for_file(file))
            .filter_map(|id| self.store.find_by_id(&id))
            .map(|b| JumpEntry {
                file: b.file.clone(),
                line: b.line,
                text: b.note.clone().unwrap_or_default(),
            })
            .collect();
        let count = entries.len();
        self.host.set_jump_list(entries);
        count
    }

    // -- autosave -----------------------------------------------------------

    /// A document changed. Restarts the autosave delay.
    pub fn on_text_changed(&mut self, now: Instant) {
        if self.state.autosave_configured {
            self.autosave.schedule(now, self.autosave_delay, ());
        }
    }

    /// Run deferred work that is due at `now`.
    pub fn tick(&mut self, now: Instant) {
        if let Some(dir) = self.pending_data_dir.take_due(now) {
            self.apply_data_dir(&dir);
        }
        if self.autosave.take_due(now).is_some() && !self.save() {
            tracing::warn!("autosave failed");
        }
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Focus left the editor: flush immediately.
    pub fn on_focus_lost(&mut self) -> bool {
        self.autosave.cancel();
        self.save()
    }

    /// Process exit: flush immediately.
    pub fn shutdown(&mut self) -> bool {
        self.autosave.cancel();
        let saved = self.save();
        tracing::info!(saved, "bookmark engine shut down");
        saved
    }
}
