//! The in-memory library aggregate.
//!
//! [`LibraryState`] holds the cached books and entries. Outside the crate it
//! is read-only: every mutation goes through the engine's named operations.

use crate::{
    adapter::JoinedEntry, query::LibraryQuery, status::MAX_READING, Book, LibraryEntry,
    ReadingStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Books and their entries, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryState {
    books: Vec<Book>,
    entries: Vec<LibraryEntry>,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total: usize,
    pub reading: usize,
    pub finished: usize,
    pub wishlist: usize,
    pub owned: usize,
}

impl LibraryState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build state from joined store rows.
    ///
    /// Books are deduplicated by id (first occurrence wins). Entries whose
    /// book is missing are dropped, since an entry never outlives its book.
    pub fn from_joined(rows: impl IntoIterator<Item = JoinedEntry>) -> Self {
        let mut seen_books = HashSet::new();
        let mut seen_entries = HashSet::new();
        let mut state = Self::new();

        for JoinedEntry { entry, book } in rows {
            let Some(book) = book else {
                tracing::warn!(entry_id = %entry.id, book_id = %entry.book_id, "dropping entry without book");
                continue;
            };
            if !seen_entries.insert(entry.id.clone()) {
                continue;
            }
            if seen_books.insert(book.id.clone()) {
                state.books.push(book);
            }
            state.entries.push(entry);
        }

        state
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn book(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn entry(&self, id: &str) -> Option<&LibraryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// The entry tracking `book_id`.
    pub fn entry_for_book(&self, book_id: &str) -> Option<&LibraryEntry> {
        self.entries.iter().find(|e| e.book_id == book_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entry_mut(&mut self, id: &str) -> Option<&mut LibraryEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub(crate) fn book_mut(&mut self, id: &str) -> Option<&mut Book> {
        self.books.iter_mut().find(|b| b.id == id)
    }

    /// Add a new pair at the front.
    pub(crate) fn prepend(&mut self, book: Book, entry: LibraryEntry) {
        self.books.retain(|b| b.id != book.id);
        self.entries.retain(|e| e.id != entry.id);
        self.books.insert(0, book);
        self.entries.insert(0, entry);
    }

    /// Remove a book together with every entry referencing it.
    pub(crate) fn remove_book(&mut self, book_id: &str) {
        self.entries.retain(|e| e.book_id != book_id);
        self.books.retain(|b| b.id != book_id);
    }

    /// Start a filtered, sorted view.
    pub fn query(&self) -> LibraryQuery<'_> {
        LibraryQuery::new(self)
    }

    /// Entries whose book title or author contains `text`, ignoring case.
    pub fn search(&self, text: &str) -> Vec<&LibraryEntry> {
        self.query().matching(text).entries()
    }

    /// The dashboard "currently reading" list.
    pub fn currently_reading(&self) -> Vec<&LibraryEntry> {
        self.entries
            .iter()
            .filter(|e| e.is_reading())
            .take(MAX_READING)
            .collect()
    }

    pub fn stats(&self) -> LibraryStats {
        let count = |status: ReadingStatus| self.entries.iter().filter(|e| e.status == status).count();
        LibraryStats {
            total: self.entries.len(),
            reading: count(ReadingStatus::Reading),
            finished: count(ReadingStatus::Finished),
            wishlist: count(ReadingStatus::Wishlist),
            owned: self.entries.iter().filter(|e| e.owned).count(),
        }
    }
}
