//! An in-memory [`RemoteStore`].
//!
//! Behaves like the real store (newest rows first, entry updates keyed by
//! book id, covers addressed by public URL) and can be told to fail the next
//! call of a given kind. Used by the test suite and for local demos.

use crate::{
    adapter::{JoinedEntry, RemoteStore, DEFAULT_COVER_BUCKET},
    error::{SyncError, SyncResult},
    Book, BookPatch, EntryPatch, LibraryEntry,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// Store calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreCall {
    InsertBook,
    UpdateBook,
    DeleteBook,
    InsertEntry,
    UpdateEntry,
    DeleteEntry,
    QueryJoined,
    UploadCover,
    DeleteCover,
}

impl StoreCall {
    fn as_str(&self) -> &'static str {
        match self {
            StoreCall::InsertBook => "insert_book",
            StoreCall::UpdateBook => "update_book",
            StoreCall::DeleteBook => "delete_book",
            StoreCall::InsertEntry => "insert_entry",
            StoreCall::UpdateEntry => "update_entry",
            StoreCall::DeleteEntry => "delete_entry",
            StoreCall::QueryJoined => "query_joined",
            StoreCall::UploadCover => "upload_cover",
            StoreCall::DeleteCover => "delete_cover",
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    /// Newest first
    books: Vec<Book>,
    /// Newest first
    entries: Vec<LibraryEntry>,
    covers: BTreeMap<String, Vec<u8>>,
    pending_failures: HashMap<StoreCall, usize>,
    calls: HashMap<StoreCall, usize>,
}

/// Thread-safe in-memory store.
#[derive(Debug)]
pub struct InMemoryStore {
    base_url: String,
    tables: Mutex<Tables>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            base_url: "memory://store".to_string(),
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Create a store pre-populated with pairs, given oldest first.
    pub fn with_pairs(pairs: impl IntoIterator<Item = (Book, LibraryEntry)>) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.lock();
            for (book, entry) in pairs {
                tables.books.insert(0, book);
                tables.entries.insert(0, entry);
            }
        }
        store
    }

    /// Make the next call of kind `call` fail.
    pub fn fail_next(&self, call: StoreCall) {
        self.fail_times(call, 1);
    }

    /// Make the next `times` calls of kind `call` fail.
    pub fn fail_times(&self, call: StoreCall, times: usize) {
        *self.tables.lock().pending_failures.entry(call).or_default() += times;
    }

    /// How many times `call` has been attempted, failures included.
    pub fn call_count(&self, call: StoreCall) -> usize {
        self.tables.lock().calls.get(&call).copied().unwrap_or(0)
    }

    pub fn book(&self, id: &str) -> Option<Book> {
        self.tables.lock().books.iter().find(|b| b.id == id).cloned()
    }

    pub fn entry_for_book(&self, book_id: &str) -> Option<LibraryEntry> {
        self.tables
            .lock()
            .entries
            .iter()
            .find(|e| e.book_id == book_id)
            .cloned()
    }

    pub fn has_cover(&self, path: &str) -> bool {
        self.tables.lock().covers.contains_key(path)
    }

    /// Record the call and consume a pending failure, if any.
    fn enter(&self, call: StoreCall) -> SyncResult<parking_lot::MutexGuard<'_, Tables>> {
        let mut tables = self.tables.lock();
        *tables.calls.entry(call).or_default() += 1;
        if let Some(remaining) = tables.pending_failures.get_mut(&call) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SyncError::new(call.as_str(), "injected failure"));
            }
        }
        Ok(tables)
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn insert_book(&self, book: &Book) -> SyncResult<()> {
        let mut tables = self.enter(StoreCall::InsertBook)?;
        if tables.books.iter().any(|b| b.id == book.id) {
            return Err(SyncError::new("insert_book", format!("duplicate book id {}", book.id)));
        }
        tables.books.insert(0, book.clone());
        Ok(())
    }

    async fn update_book(&self, book_id: &str, patch: &BookPatch) -> SyncResult<()> {
        let mut tables = self.enter(StoreCall::UpdateBook)?;
        if let Some(book) = tables.books.iter_mut().find(|b| b.id == book_id) {
            patch.apply_to(book);
        }
        Ok(())
    }

    async fn delete_book(&self, book_id: &str) -> SyncResult<()> {
        let mut tables = self.enter(StoreCall::DeleteBook)?;
        if tables.entries.iter().any(|e| e.book_id == book_id) {
            return Err(SyncError::new(
                "delete_book",
                format!("book {book_id} is still referenced by an entry"),
            ));
        }
        tables.books.retain(|b| b.id != book_id);
        Ok(())
    }

    async fn insert_entry(&self, entry: &LibraryEntry) -> SyncResult<()> {
        let mut tables = self.enter(StoreCall::InsertEntry)?;
        if !tables.books.iter().any(|b| b.id == entry.book_id) {
            return Err(SyncError::new(
                "insert_entry",
                format!("book {} does not exist", entry.book_id),
            ));
        }
        if tables.entries.iter().any(|e| e.id == entry.id) {
            return Err(SyncError::new("insert_entry", format!("duplicate entry id {}", entry.id)));
        }
        tables.entries.insert(0, entry.clone());
        Ok(())
    }

    async fn update_entry(&self, book_id: &str, patch: &EntryPatch) -> SyncResult<()> {
        let mut tables = self.enter(StoreCall::UpdateEntry)?;
        for entry in tables.entries.iter_mut().filter(|e| e.book_id == book_id) {
            patch.apply_to(entry);
        }
        Ok(())
    }

    async fn delete_entry(&self, book_id: &str) -> SyncResult<()> {
        let mut tables = self.enter(StoreCall::DeleteEntry)?;
        tables.entries.retain(|e| e.book_id != book_id);
        Ok(())
    }

    async fn query_joined(&self, filter: Option<&str>) -> SyncResult<Vec<JoinedEntry>> {
        let tables = self.enter(StoreCall::QueryJoined)?;
        let needle = filter.map(str::to_lowercase);

        let rows = tables
            .entries
            .iter()
            .map(|entry| JoinedEntry {
                entry: entry.clone(),
                book: tables.books.iter().find(|b| b.id == entry.book_id).cloned(),
            })
            .filter(|row| match (&needle, &row.book) {
                (None, _) => true,
                (Some(needle), Some(book)) => {
                    book.title.to_lowercase().contains(needle.as_str())
                        || book.author.to_lowercase().contains(needle.as_str())
                }
                (Some(_), None) => false,
            })
            .collect();
        Ok(rows)
    }

    async fn upload_cover(&self, file_name: &str, bytes: Vec<u8>) -> SyncResult<String> {
        let mut tables = self.enter(StoreCall::UploadCover)?;
        tables.covers.insert(file_name.to_string(), bytes);
        Ok(format!("{}/{}/{}", self.base_url, DEFAULT_COVER_BUCKET, file_name))
    }

    async fn delete_cover(&self, path: &str) -> SyncResult<()> {
        let mut tables = self.enter(StoreCall::DeleteCover)?;
        tables.covers.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapter::cover_path, ReadingStatus};

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn pair(id: &str) -> (Book, LibraryEntry) {
        (
            Book::new(format!("b-{id}"), format!("Title {id}"), "Author"),
            LibraryEntry::new(format!("e-{id}"), format!("b-{id}"), ReadingStatus::Owned),
        )
    }

    #[test]
    fn rows_come_back_newest_first() {
        let store = InMemoryStore::with_pairs([pair("1"), pair("2")]);
        let rows = block_on(store.query_joined(None)).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.entry.id.as_str()).collect();
        assert_eq!(ids, vec!["e-2", "e-1"]);
    }

    #[test]
    fn injected_failure_is_one_shot() {
        let store = InMemoryStore::new();
        store.fail_next(StoreCall::QueryJoined);

        let err = block_on(store.query_joined(None)).unwrap_err();
        assert_eq!(err.context, "query_joined");
        assert!(block_on(store.query_joined(None)).is_ok());
        assert_eq!(store.call_count(StoreCall::QueryJoined), 2);
    }

    #[test]
    fn entry_requires_book() {
        let store = InMemoryStore::new();
        let (_, entry) = pair("1");
        assert!(block_on(store.insert_entry(&entry)).is_err());
    }

    #[test]
    fn book_delete_refuses_dangling_entries() {
        let store = InMemoryStore::with_pairs([pair("1")]);
        assert!(block_on(store.delete_book("b-1")).is_err());
        block_on(store.delete_entry("b-1")).unwrap();
        block_on(store.delete_book("b-1")).unwrap();
        assert!(store.book("b-1").is_none());
    }

    #[test]
    fn cover_urls_resolve_to_paths() {
        let store = InMemoryStore::new();
        let url = block_on(store.upload_cover("abc.jpg", vec![1, 2, 3])).unwrap();
        let path = cover_path(&url, store.cover_bucket()).unwrap();
        assert!(store.has_cover(&path));

        block_on(store.delete_cover(&path)).unwrap();
        assert!(!store.has_cover(&path));
    }

    #[test]
    fn filter_matches_title_or_author() {
        let store = InMemoryStore::with_pairs([pair("1"), pair("2")]);
        let rows = block_on(store.query_joined(Some("title 1"))).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entry.id, "e-1");
    }
}
