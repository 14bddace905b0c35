//! Filtered and sorted views over the library.

use crate::{Book, LibraryEntry, LibraryState, ReadingStatus};
use serde::{Deserialize, Serialize};

/// Ownership filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ownership {
    #[default]
    All,
    Owned,
    NotOwned,
}

impl Ownership {
    fn admits(self, entry: &LibraryEntry) -> bool {
        match self {
            Ownership::All => true,
            Ownership::Owned => entry.owned,
            Ownership::NotOwned => !entry.owned,
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Library order: newest first
    #[default]
    Recent,
    /// Highest priority first; ties keep library order
    Priority,
}

/// Builder for querying entries.
#[derive(Debug, Clone)]
pub struct LibraryQuery<'a> {
    state: &'a LibraryState,
    status: Option<ReadingStatus>,
    ownership: Ownership,
    text: Option<String>,
    sort: SortOrder,
}

impl<'a> LibraryQuery<'a> {
    pub(crate) fn new(state: &'a LibraryState) -> Self {
        Self {
            state,
            status: None,
            ownership: Ownership::All,
            text: None,
            sort: SortOrder::Recent,
        }
    }

    /// Only entries with this status.
    pub fn status(mut self, status: ReadingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = ownership;
        self
    }

    /// Only entries whose book title or author contains `text`, ignoring
    /// case. Blank text matches everything.
    pub fn matching(mut self, text: &str) -> Self {
        let text = text.trim().to_lowercase();
        self.text = (!text.is_empty()).then_some(text);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Get all matching entries.
    pub fn entries(self) -> Vec<&'a LibraryEntry> {
        self.with_books().into_iter().map(|(entry, _)| entry).collect()
    }

    /// Count matching entries.
    pub fn count(self) -> usize {
        self.with_books().len()
    }

    /// Matching entries paired with their cached book.
    pub fn with_books(self) -> Vec<(&'a LibraryEntry, &'a Book)> {
        let state = self.state;
        let mut rows: Vec<_> = state
            .entries()
            .iter()
            .filter(|e| self.status.map_or(true, |s| e.status == s))
            .filter(|e| self.ownership.admits(e))
            .filter_map(|e| state.book(&e.book_id).map(|b| (e, b)))
            .filter(|(_, b)| self.text.as_deref().map_or(true, |t| book_matches(b, t)))
            .collect();

        if self.sort == SortOrder::Priority {
            rows.sort_by(|(a, _), (b, _)| b.priority.cmp(&a.priority));
        }
        rows
    }
}

fn book_matches(book: &Book, needle: &str) -> bool {
    book.title.to_lowercase().contains(needle) || book.author.to_lowercase().contains(needle)
}
