//! In-memory bookmark collection with a per-file, line-sorted index.
//!
//! The flat list keeps insertion order and is what gets persisted. The file
//! index exists so navigation and range queries never sort at query time:
//! every mutation keeps each file's entries in ascending line order.

use std::collections::HashMap;

use super::types::Bookmark;

/// One slot in a file's sorted index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub line: u32,
    pub id: String,
}

#[derive(Debug, Default)]
pub struct BookmarkStore {
    bookmarks: Vec<Bookmark>,
    file_index: HashMap<String, Vec<IndexEntry>>,
    loaded: bool,
}

impl BookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Run `load` the first time only. Later calls are no-ops until [`reload`](Self::reload).
    pub fn ensure_loaded(&mut self, load: impl FnOnce() -> Vec<Bookmark>) {
        if self.loaded {
            return;
        }
        self.replace_all(load());
    }

    /// Drop everything and load again, e.g. after a scope switch.
    pub fn reload(&mut self, load: impl FnOnce() -> Vec<Bookmark>) {
        self.bookmarks.clear();
        self.file_index.clear();
        self.loaded = false;
        self.replace_all(load());
    }

    fn replace_all(&mut self, bookmarks: Vec<Bookmark>) {
        self.bookmarks = bookmarks.into_iter().map(|b| b.detached()).collect();
        self.rebuild_index();
        self.loaded = true;
        tracing::debug!(count = self.bookmarks.len(), "bookmark store loaded");
    }

    fn rebuild_index(&mut self) {
        self.file_index.clear();
        for bookmark in &self.bookmarks {
            let entries = self.file_index.entry(bookmark.file.clone()).or_default();
            insert_sorted(entries, bookmark.line, &bookmark.id);
        }
    }

    /// Append to the flat list and binary-insert into the file index.
    pub fn add(&mut self, bookmark: Bookmark) {
        let entries = self.file_index.entry(bookmark.file.clone()).or_default();
        insert_sorted(entries, bookmark.line, &bookmark.id);
        self.bookmarks.push(bookmark);
    }

    /// Remove by id. Returns the removed bookmark.
    pub fn remove(&mut self, id: &str) -> Option<Bookmark> {
        let index = self.bookmarks.iter().position(|b| b.id == id)?;
        self.remove_at(index)
    }

    /// Remove by position in the flat list.
    pub fn remove_at(&mut self, index: usize) -> Option<Bookmark> {
        if index >= self.bookmarks.len() {
            return None;
        }
        let removed = self.bookmarks.remove(index);
        self.unindex(&removed.file, &removed.id);
        Some(removed)
    }

    fn unindex(&mut self, file: &str, id: &str) {
        let Some(entries) = self.file_index.get_mut(file) else {
            return;
        };
        if let Some(pos) = entries.iter().position(|e| e.id == id) {
            entries.remove(pos);
        }
        // Drop empty keys so stale files don't accumulate.
        if entries.is_empty() {
            self.file_index.remove(file);
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Bookmark> {
        self.bookmarks.iter_mut().find(|b| b.id == id)
    }

    /// Exact match on stored `(file, line)`. Empty `file` never matches.
    pub fn find_at_line(&self, file: &str, line: u32) -> Option<&Bookmark> {
        if file.is_empty() {
            return None;
        }
        let entries = self.file_index.get(file)?;
        let start = entries.partition_point(|e| e.line < line);
        entries[start..]
            .iter()
            .take_while(|e| e.line == line)
            .find_map(|e| self.find_by_id(&e.id))
    }

    /// The maintained index for `file`, ascending by line.
    pub fn sorted_for_file(&self, file: &str) -> &[IndexEntry] {
        self.file_index
            .get(file)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Ids of the bookmarks in `file`, in line order.
    pub fn ids_for_file(&self, file: &str) -> Vec<String> {
        self.sorted_for_file(file)
            .iter()
            .map(|e| e.id.clone())
            .collect()
    }

    /// Re-sort one file's index after stored lines were refreshed.
    pub fn reindex_file(&mut self, file: &str) {
        let mut entries: Vec<IndexEntry> = self
            .bookmarks
            .iter()
            .filter(|b| b.file == file)
            .map(|b| IndexEntry {
                line: b.line,
                id: b.id.clone(),
            })
            .collect();
        if entries.is_empty() {
            self.file_index.remove(file);
            return;
        }
        // Stable: equal lines keep insertion order.
        entries.sort_by_key(|e| e.line);
        self.file_index.insert(file.to_string(), entries);
    }

    /// Remove every bookmark in `file`, returning them.
    pub fn clear_for_file(&mut self, file: &str) -> Vec<Bookmark> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.bookmarks)
            .into_iter()
            .partition(|b| b.file == file);
        self.bookmarks = kept;
        self.file_index.remove(file);
        removed
    }

    /// Remove everything, returning what was there.
    pub fn clear_all(&mut self) -> Vec<Bookmark> {
        self.file_index.clear();
        std::mem::take(&mut self.bookmarks)
    }

    /// Independent copy of every bookmark.
    pub fn get_all(&self) -> Vec<Bookmark> {
        self.bookmarks.clone()
    }

    /// The live collection, for updating anchor handles in place.
    /// Callers that change `line` must follow up with [`reindex_file`](Self::reindex_file).
    pub fn raw_mut(&mut self) -> &mut [Bookmark] {
        &mut self.bookmarks
    }

    pub fn as_slice(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bookmark> {
        self.bookmarks.iter()
    }

    /// Files that currently have at least one bookmark, sorted.
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.file_index.keys().cloned().collect();
        files.sort();
        files
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }
}

/// Insert at the first position whose line is `>= line`.
fn insert_sorted(entries: &mut Vec<IndexEntry>, line: u32, id: &str) {
    let pos = entries.partition_point(|e| e.line < line);
    entries.insert(
        pos,
        IndexEntry {
            line,
            id: id.to_string(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(store: &BookmarkStore, file: &str) -> Vec<u32> {
        store.sorted_for_file(file).iter().map(|e| e.line).collect()
    }

    fn assert_sorted(store: &BookmarkStore) {
        for file in store.files() {
            let l = lines(store, &file);
            assert!(l.windows(2).all(|w| w[0] <= w[1]), "{file}: {l:?}");
        }
    }

    #[test]
    fn out_of_order_adds_come_back_sorted() {
        let mut store = BookmarkStore::new();
        for line in [5, 1, 3] {
            store.add(Bookmark::new("/f.rs", line, None));
        }
        assert_eq!(lines(&store, "/f.rs"), vec![1, 3, 5]);
    }

    #[test]
    fn index_stays_sorted_under_mixed_mutations() {
        let mut store = BookmarkStore::new();
        let mut ids = Vec::new();
        for (i, line) in [40u32, 7, 19, 7, 88, 2, 63, 19, 1, 50].iter().enumerate() {
            let file = if i % 2 == 0 { "/a.rs" } else { "/b.rs" };
            let bookmark = Bookmark::new(file, *line, None);
            ids.push(bookmark.id.clone());
            store.add(bookmark);
            assert_sorted(&store);
        }
        for id in ids.iter().step_by(3) {
            assert!(store.remove(id).is_some());
            assert_sorted(&store);
        }
        store.add(Bookmark::new("/a.rs", 20, None));
        assert_sorted(&store);
    }

    #[test]
    fn lookup_consistency() {
        let mut store = BookmarkStore::new();
        let bookmark = Bookmark::new("/f.rs", 12, Some("hi".into()));
        let id = bookmark.id.clone();
        store.add(bookmark.clone());

        assert_eq!(store.find_by_id(&id), Some(&bookmark));
        assert_eq!(store.find_at_line("/f.rs", 12).map(|b| &b.id), Some(&id));

        store.remove(&id);
        assert!(store.find_by_id(&id).is_none());
        assert!(store.find_at_line("/f.rs", 12).is_none());
    }

    #[test]
    fn empty_path_finds_nothing() {
        let mut store = BookmarkStore::new();
        store.add(Bookmark::new("/f.rs", 10, None));
        assert!(store.find_at_line("", 10).is_none());
    }

    #[test]
    fn emptied_files_drop_their_index_key() {
        let mut store = BookmarkStore::new();
        let bookmark = Bookmark::new("/gone.rs", 1, None);
        let id = bookmark.id.clone();
        store.add(bookmark);
        store.remove(&id);
        assert!(store.files().is_empty());
        assert!(store.sorted_for_file("/gone.rs").is_empty());
    }

    #[test]
    fn remove_at_out_of_range_is_none() {
        let mut store = BookmarkStore::new();
        assert!(store.remove_at(0).is_none());
    }

    #[test]
    fn clear_for_file_returns_removed() {
        let mut store = BookmarkStore::new();
        store.add(Bookmark::new("/a.rs", 1, None));
        store.add(Bookmark::new("/a.rs", 2, None));
        store.add(Bookmark::new("/b.rs", 1, None));

        let removed = store.clear_for_file("/a.rs");
        assert_eq!(removed.len(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.files(), vec!["/b.rs".to_string()]);

        let rest = store.clear_all();
        assert_eq!(rest.len(), 1);
        assert!(store.is_empty());
        assert!(store.files().is_empty());
    }

    #[test]
    fn get_all_is_an_independent_copy() {
        let mut store = BookmarkStore::new();
        store.add(Bookmark::new("/a.rs", 1, None));
        let mut copy = store.get_all();
        copy[0].note = Some("changed".into());
        assert!(store.iter().next().unwrap().note.is_none());
    }

    #[test]
    fn load_is_one_shot_until_reload() {
        let mut store = BookmarkStore::new();
        let mut calls = 0;
        store.ensure_loaded(|| {
            calls += 1;
            vec![Bookmark::new("/a.rs", 3, None)]
        });
        store.ensure_loaded(|| {
            calls += 1;
            Vec::new()
        });
        assert_eq!(calls, 1);
        assert_eq!(store.len(), 1);

        store.reload(|| vec![Bookmark::new("/b.rs", 9, None), Bookmark::new("/b.rs", 2, None)]);
        assert_eq!(store.len(), 2);
        assert!(store.sorted_for_file("/a.rs").is_empty());
        assert_eq!(lines(&store, "/b.rs"), vec![2, 9]);
    }

    #[test]
    fn reindex_restores_order_after_line_changes() {
        let mut store = BookmarkStore::new();
        store.add(Bookmark::new("/a.rs", 1, None));
        store.add(Bookmark::new("/a.rs", 5, None));
        store.raw_mut()[0].line = 10;
        store.reindex_file("/a.rs");
        assert_eq!(lines(&store, "/a.rs"), vec![5, 10]);
    }
}
