//! Partial updates to entries and books.
//!
//! A patch is both the optimistic local change and the payload sent to the
//! remote store, so the two can never disagree about which fields moved.

use crate::{Book, LibraryEntry, Priority, Rating, ReadingStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which tracking date a date edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateField {
    StartedAt,
    FinishedAt,
}

/// Names of the entry fields a patch can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryField {
    Status,
    Owned,
    Priority,
    Rating,
    Hooked,
    Notes,
    RichNotes,
    StartedAt,
    FinishedAt,
}

impl EntryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryField::Status => "status",
            EntryField::Owned => "owned",
            EntryField::Priority => "priority",
            EntryField::Rating => "rating",
            EntryField::Hooked => "hooked",
            EntryField::Notes => "notes",
            EntryField::RichNotes => "richNotes",
            EntryField::StartedAt => "startedAt",
            EntryField::FinishedAt => "finishedAt",
        }
    }
}

/// A partial set of entry fields.
///
/// `None` means "untouched". Nullable fields use `Some(None)` for "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    pub status: Option<ReadingStatus>,
    pub owned: Option<bool>,
    pub priority: Option<Priority>,
    pub rating: Option<Option<Rating>>,
    pub hooked: Option<bool>,
    pub notes: Option<Option<String>>,
    pub rich_notes: Option<Option<String>>,
    pub started_at: Option<Option<NaiveDate>>,
    pub finished_at: Option<Option<NaiveDate>>,
}

impl EntryPatch {
    /// A patch touching a single date field.
    pub fn date(field: DateField, value: Option<NaiveDate>) -> Self {
        match field {
            DateField::StartedAt => Self {
                started_at: Some(value),
                ..Self::default()
            },
            DateField::FinishedAt => Self {
                finished_at: Some(value),
                ..Self::default()
            },
        }
    }

    /// True if the patch touches nothing.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// The fields this patch touches, in a fixed order.
    pub fn fields(&self) -> Vec<EntryField> {
        let mut fields = Vec::new();
        let touched = [
            (self.status.is_some(), EntryField::Status),
            (self.owned.is_some(), EntryField::Owned),
            (self.priority.is_some(), EntryField::Priority),
            (self.rating.is_some(), EntryField::Rating),
            (self.hooked.is_some(), EntryField::Hooked),
            (self.notes.is_some(), EntryField::Notes),
            (self.rich_notes.is_some(), EntryField::RichNotes),
            (self.started_at.is_some(), EntryField::StartedAt),
            (self.finished_at.is_some(), EntryField::FinishedAt),
        ];
        for (is_set, field) in touched {
            if is_set {
                fields.push(field);
            }
        }
        fields
    }

    /// Write the touched fields into `entry`.
    pub fn apply_to(&self, entry: &mut LibraryEntry) {
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(owned) = self.owned {
            entry.owned = owned;
        }
        if let Some(priority) = self.priority {
            entry.priority = priority;
        }
        if let Some(rating) = self.rating {
            entry.rating = rating;
        }
        if let Some(hooked) = self.hooked {
            entry.hooked = hooked;
        }
        if let Some(notes) = &self.notes {
            entry.notes = notes.clone();
        }
        if let Some(rich_notes) = &self.rich_notes {
            entry.rich_notes = rich_notes.clone();
        }
        if let Some(started_at) = self.started_at {
            entry.started_at = started_at;
        }
        if let Some(finished_at) = self.finished_at {
            entry.finished_at = finished_at;
        }
    }

    /// The patch that puts back `entry`'s current values for exactly the
    /// fields this patch touches.
    pub fn inverse_for(&self, entry: &LibraryEntry) -> EntryPatch {
        EntryPatch {
            status: self.status.map(|_| entry.status),
            owned: self.owned.map(|_| entry.owned),
            priority: self.priority.map(|_| entry.priority),
            rating: self.rating.map(|_| entry.rating),
            hooked: self.hooked.map(|_| entry.hooked),
            notes: self.notes.as_ref().map(|_| entry.notes.clone()),
            rich_notes: self.rich_notes.as_ref().map(|_| entry.rich_notes.clone()),
            started_at: self.started_at.map(|_| entry.started_at),
            finished_at: self.finished_at.map(|_| entry.finished_at),
        }
    }

    /// Every tracking field of `entry`, as a patch.
    pub fn full(entry: &LibraryEntry) -> EntryPatch {
        EntryPatch {
            status: Some(entry.status),
            owned: Some(entry.owned),
            priority: Some(entry.priority),
            rating: Some(entry.rating),
            hooked: Some(entry.hooked),
            notes: Some(entry.notes.clone()),
            rich_notes: Some(entry.rich_notes.clone()),
            started_at: Some(entry.started_at),
            finished_at: Some(entry.finished_at),
        }
    }
}

/// The editable metadata of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: String,
    pub author: String,
    pub cover_url: Option<String>,
    pub description: Option<String>,
}

impl BookPatch {
    pub fn apply_to(&self, book: &mut Book) {
        book.title = self.title.clone();
        book.author = self.author.clone();
        book.cover_url = self.cover_url.clone();
        book.description = self.description.clone();
    }

    /// The patch restoring `book`'s current metadata.
    pub fn capture(book: &Book) -> BookPatch {
        BookPatch {
            title: book.title.clone(),
            author: book.author.clone(),
            cover_url: book.cover_url.clone(),
            description: book.description.clone(),
        }
    }
}
