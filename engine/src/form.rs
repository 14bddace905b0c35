//! The add/edit book form payload.

use crate::{
    error::Violation, status, Book, BookId, BookPatch, EntryId, EntryPatch, LibraryEntry,
    Priority, Rating, ReadingStatus,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Values collected by the add/edit book form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub status: ReadingStatus,
    pub priority: Priority,
    pub owned: bool,
    pub rating: Option<Rating>,
    pub notes: Option<String>,
}

impl BookForm {
    /// A blank form, as shown when adding a book.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            description: None,
            cover_url: None,
            status: ReadingStatus::Wishlist,
            priority: Priority::default(),
            owned: false,
            rating: None,
            notes: None,
        }
    }

    /// Pre-fill the form from an existing pair.
    pub fn from_existing(book: &Book, entry: &LibraryEntry) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            description: book.description.clone(),
            cover_url: book.cover_url.clone(),
            status: entry.status,
            priority: entry.priority,
            owned: entry.owned,
            rating: entry.rating,
            notes: entry.notes.clone(),
        }
    }

    /// Normalise and check the form.
    ///
    /// Title and author are trimmed and must be non-empty; blank optional text
    /// becomes `None`; a wishlist book is never owned; a rating requires the
    /// finished status.
    pub fn validate(&self) -> Result<BookForm, Violation> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Violation::EmptyTitle);
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(Violation::EmptyAuthor);
        }
        if self.rating.is_some() && self.status != ReadingStatus::Finished {
            return Err(Violation::RatingRequiresFinished);
        }

        Ok(BookForm {
            title: title.to_string(),
            author: author.to_string(),
            description: non_blank(&self.description),
            cover_url: non_blank(&self.cover_url),
            status: self.status,
            priority: self.priority,
            owned: self.owned && self.status != ReadingStatus::Wishlist,
            rating: self.rating,
            notes: non_blank(&self.notes),
        })
    }

    pub fn book_patch(&self) -> BookPatch {
        BookPatch {
            title: self.title.clone(),
            author: self.author.clone(),
            cover_url: self.cover_url.clone(),
            description: self.description.clone(),
        }
    }

    /// The new book record for a create.
    pub fn new_book(&self, id: BookId) -> Book {
        Book {
            id,
            title: self.title.clone(),
            author: self.author.clone(),
            cover_url: self.cover_url.clone(),
            description: self.description.clone(),
        }
    }

    /// The new entry record for a create, with dates derived from the status.
    pub fn new_entry(&self, id: EntryId, book_id: BookId, today: NaiveDate) -> LibraryEntry {
        let (started_at, finished_at) = status::edit_stamps(None, self.status, today);
        LibraryEntry {
            id,
            book_id,
            status: self.status,
            owned: self.owned,
            priority: self.priority,
            rating: self.rating,
            hooked: false,
            notes: self.notes.clone(),
            rich_notes: None,
            started_at: started_at.flatten(),
            finished_at: finished_at.flatten(),
        }
    }

    /// The tracking-field patch for editing `existing`.
    pub fn entry_patch(&self, existing: &LibraryEntry, today: NaiveDate) -> EntryPatch {
        let (started_at, finished_at) = status::edit_stamps(Some(existing), self.status, today);
        EntryPatch {
            status: Some(self.status),
            owned: Some(self.owned),
            priority: Some(self.priority),
            rating: Some(self.rating),
            notes: Some(self.notes.clone()),
            started_at,
            finished_at,
            ..EntryPatch::default()
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
