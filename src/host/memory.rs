//! Headless document host.
//!
//! Keeps documents as line vectors and emulates editor anchors: inserting
//! lines shifts anchors below the insertion point, anchors sitting exactly
//! at the insertion row stay put (left gravity), and anchors on deleted
//! lines are invalidated. Used by the CLI to act on files from disk and by
//! tests to observe what the engine draws.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

use super::{
    AnchorId, Cursor, DocumentAnchorProvider, DocumentId, DocumentInfo, DocumentKind, JumpEntry,
    MarkerStyle,
};

#[derive(Debug, Clone)]
struct AnchorState {
    /// 1-based row, `None` once the line was deleted.
    row: Option<u32>,
    marker: Option<MarkerStyle>,
    annotation: Option<(String, String)>,
}

#[derive(Debug, Clone)]
struct Document {
    info: DocumentInfo,
    lines: Vec<String>,
    anchors: BTreeMap<AnchorId, AnchorState>,
}

/// In-memory implementation of [`DocumentAnchorProvider`].
#[derive(Debug, Default)]
pub struct MemoryHost {
    documents: BTreeMap<DocumentId, Document>,
    next_document: u64,
    next_anchor: u64,
    cursor: Option<Cursor>,
    prompt_answers: VecDeque<Option<String>>,
    confirm_answers: VecDeque<bool>,
    jump_list: Vec<JumpEntry>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a file-backed document with the given text.
    pub fn open(&mut self, path: impl Into<String>, text: &str) -> DocumentId {
        self.open_with(
            DocumentInfo {
                path: path.into(),
                kind: DocumentKind::File,
                modifiable: true,
            },
            text,
        )
    }

    /// Open a document with explicit metadata.
    pub fn open_with(&mut self, info: DocumentInfo, text: &str) -> DocumentId {
        self.next_document += 1;
        let id = DocumentId(self.next_document);
        let lines = text.lines().map(str::to_string).collect();
        self.documents.insert(
            id,
            Document {
                info,
                lines,
                anchors: BTreeMap::new(),
            },
        );
        id
    }

    /// Read `path` from disk and open it.
    pub fn open_file(&mut self, path: &Path) -> Result<DocumentId> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(self.open(path.to_string_lossy().into_owned(), &text))
    }

    /// Close a document, dropping its anchors.
    pub fn close(&mut self, doc: DocumentId) {
        self.documents.remove(&doc);
        if self.cursor.is_some_and(|c| c.document == doc) {
            self.cursor = None;
        }
    }

    pub fn document_by_path(&self, path: &str) -> Option<DocumentId> {
        self.documents
            .iter()
            .find(|(_, d)| d.info.path == path)
            .map(|(id, _)| *id)
    }

    /// Insert `new_lines` before line `at` (1-based; `len + 1` appends).
    pub fn insert_lines(&mut self, doc: DocumentId, at: u32, new_lines: &[&str]) {
        let Some(document) = self.documents.get_mut(&doc) else {
            return;
        };
        let index = (at.max(1) as usize - 1).min(document.lines.len());
        let count = new_lines.len() as u32;
        for (offset, line) in new_lines.iter().enumerate() {
            document.lines.insert(index + offset, (*line).to_string());
        }
        let at = index as u32 + 1;
        for anchor in document.anchors.values_mut() {
            if let Some(row) = anchor.row.as_mut() {
                if *row > at {
                    *row += count;
                }
            }
        }
    }

    /// Delete `count` lines starting at `start` (1-based).
    pub fn delete_lines(&mut self, doc: DocumentId, start: u32, count: u32) {
        let Some(document) = self.documents.get_mut(&doc) else {
            return;
        };
        let len = document.lines.len() as u32;
        if start == 0 || start > len || count == 0 {
            return;
        }
        let end = (start + count).min(len + 1);
        document
            .lines
            .drain(start as usize - 1..end as usize - 1);
        let removed = end - start;
        for anchor in document.anchors.values_mut() {
            match anchor.row {
                Some(row) if row >= start && row < end => anchor.row = None,
                Some(row) if row >= end => anchor.row = Some(row - removed),
                _ => {}
            }
        }
    }

    /// Queue the answer for the next [`prompt`](DocumentAnchorProvider::prompt).
    pub fn push_prompt_answer(&mut self, answer: Option<&str>) {
        self.prompt_answers.push_back(answer.map(str::to_string));
    }

    /// Queue the answer for the next [`confirm`](DocumentAnchorProvider::confirm).
    pub fn push_confirm_answer(&mut self, answer: bool) {
        self.confirm_answers.push_back(answer);
    }

    pub fn jump_list(&self) -> &[JumpEntry] {
        &self.jump_list
    }

    /// Live anchors in `doc`, including annotation anchors.
    pub fn anchor_count(&self, doc: DocumentId) -> usize {
        self.documents
            .get(&doc)
            .map_or(0, |d| d.anchors.values().filter(|a| a.row.is_some()).count())
    }

    /// Lines carrying a gutter marker, ascending.
    pub fn marker_lines(&self, doc: DocumentId) -> Vec<u32> {
        let mut lines: Vec<u32> = self
            .documents
            .get(&doc)
            .map(|d| {
                d.anchors
                    .values()
                    .filter(|a| a.marker.is_some())
                    .filter_map(|a| a.row)
                    .collect()
            })
            .unwrap_or_default();
        lines.sort_unstable();
        lines
    }

    /// `(line, text)` of every visible annotation, ascending by line.
    pub fn annotations(&self, doc: DocumentId) -> Vec<(u32, String)> {
        let mut out: Vec<(u32, String)> = self
            .documents
            .get(&doc)
            .map(|d| {
                d.anchors
                    .values()
                    .filter_map(|a| Some((a.row?, a.annotation.as_ref()?.0.clone())))
                    .collect()
            })
            .unwrap_or_default();
        out.sort();
        out
    }

    fn new_anchor(&mut self, doc: DocumentId, line: u32) -> Option<(AnchorId, &mut AnchorState)> {
        let document = self.documents.get_mut(&doc)?;
        if line == 0 || line as usize > document.lines.len() {
            return None;
        }
        self.next_anchor += 1;
        let id = AnchorId(self.next_anchor);
        let state = document.anchors.entry(id).or_insert(AnchorState {
            row: Some(line),
            marker: None,
            annotation: None,
        });
        Some((id, state))
    }
}

impl DocumentAnchorProvider for MemoryHost {
    fn document_info(&self, doc: DocumentId) -> Option<DocumentInfo> {
        self.documents.get(&doc).map(|d| d.info.clone())
    }

    fn line_count(&self, doc: DocumentId) -> Option<u32> {
        self.documents.get(&doc).map(|d| d.lines.len() as u32)
    }

    fn open_documents(&self) -> Vec<DocumentId> {
        self.documents.keys().copied().collect()
    }

    fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    fn set_cursor(&mut self, doc: DocumentId, line: u32) {
        if self.documents.contains_key(&doc) {
            self.cursor = Some(Cursor {
                document: doc,
                line,
            });
        }
    }

    fn create_tracking_anchor(&mut self, doc: DocumentId, line: u32) -> Option<AnchorId> {
        self.new_anchor(doc, line).map(|(id, _)| id)
    }

    fn anchor_line(&self, doc: DocumentId, anchor: AnchorId) -> Option<u32> {
        self.documents.get(&doc)?.anchors.get(&anchor)?.row
    }

    fn delete_anchor(&mut self, doc: DocumentId, anchor: AnchorId) {
        if let Some(document) = self.documents.get_mut(&doc) {
            document.anchors.remove(&anchor);
        }
    }

    fn place_marker(&mut self, doc: DocumentId, anchor: AnchorId, style: &MarkerStyle) -> bool {
        let Some(state) = self
            .documents
            .get_mut(&doc)
            .and_then(|d| d.anchors.get_mut(&anchor))
        else {
            return false;
        };
        if state.row.is_none() {
            return false;
        }
        state.marker = Some(style.clone());
        true
    }

    fn remove_marker(&mut self, doc: DocumentId, anchor: AnchorId) {
        if let Some(state) = self
            .documents
            .get_mut(&doc)
            .and_then(|d| d.anchors.get_mut(&anchor))
        {
            state.marker = None;
        }
    }

    fn create_annotation(
        &mut self,
        doc: DocumentId,
        line: u32,
        text: &str,
        highlight: &str,
    ) -> Option<AnchorId> {
        let (id, state) = self.new_anchor(doc, line)?;
        state.annotation = Some((text.to_string(), highlight.to_string()));
        Some(id)
    }

    fn delete_annotation(&mut self, doc: DocumentId, annotation: AnchorId) {
        self.delete_anchor(doc, annotation);
    }

    fn has_visuals(&self, doc: DocumentId) -> bool {
        self.documents
            .get(&doc)
            .is_some_and(|d| !d.anchors.is_empty())
    }

    fn clear_visuals(&mut self, doc: DocumentId) {
        if let Some(document) = self.documents.get_mut(&doc) {
            document.anchors.clear();
        }
    }

    fn prompt(&mut self, _message: &str, _default: Option<&str>) -> Option<String> {
        self.prompt_answers.pop_front().flatten()
    }

    fn confirm(&mut self, _message: &str) -> bool {
        self.confirm_answers.pop_front().unwrap_or(false)
    }

    fn set_jump_list(&mut self, entries: Vec<JumpEntry>) {
        self.jump_list = entries;
    }
}
