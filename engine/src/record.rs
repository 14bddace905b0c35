//! Book and library entry records.

use crate::{error::Violation, BookId, EntryId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reading state of a library entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    Wishlist,
    Owned,
    Reading,
    Paused,
    Finished,
    Abandoned,
}

impl ReadingStatus {
    /// Every status, in display order.
    pub const ALL: [ReadingStatus; 6] = [
        ReadingStatus::Wishlist,
        ReadingStatus::Owned,
        ReadingStatus::Reading,
        ReadingStatus::Paused,
        ReadingStatus::Finished,
        ReadingStatus::Abandoned,
    ];

    /// The spelling used by the remote store.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Wishlist => "wishlist",
            ReadingStatus::Owned => "owned",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Paused => "paused",
            ReadingStatus::Finished => "finished",
            ReadingStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = Violation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReadingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Violation::UnknownStatus(s.to_string()))
    }
}

/// How much the user wants to read a book, 1 (low) to 5 (high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority(3)
    }
}

impl TryFrom<i64> for Priority {
    type Error = Violation;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Priority(value as u8))
        } else {
            Err(Violation::PriorityOutOfRange(value))
        }
    }
}

impl From<Priority> for i64 {
    fn from(p: Priority) -> Self {
        p.0 as i64
    }
}

/// A star rating, 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = Violation;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(Violation::RatingOutOfRange(value))
        }
    }
}

impl From<Rating> for i64 {
    fn from(r: Rating) -> Self {
        r.0 as i64
    }
}

/// Book metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Stable unique identifier
    pub id: BookId,
    /// Non-empty title
    pub title: String,
    /// Non-empty author
    pub author: String,
    /// Public URL of the stored cover image
    pub cover_url: Option<String>,
    pub description: Option<String>,
}

impl Book {
    /// Create a book with no cover or description.
    pub fn new(id: impl Into<BookId>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            cover_url: None,
            description: None,
        }
    }
}

/// The mutable reading-tracking record for one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    /// Unique identifier of this entry
    pub id: EntryId,
    /// The book this entry tracks
    pub book_id: BookId,
    pub status: ReadingStatus,
    pub owned: bool,
    pub priority: Priority,
    /// Only set while `status` is finished
    pub rating: Option<Rating>,
    /// Informational "couldn't put it down" flag
    pub hooked: bool,
    pub notes: Option<String>,
    /// Structured editor document, serialized as text
    pub rich_notes: Option<String>,
    pub started_at: Option<NaiveDate>,
    pub finished_at: Option<NaiveDate>,
}

impl LibraryEntry {
    /// Create an entry with default tracking fields.
    pub fn new(id: impl Into<EntryId>, book_id: impl Into<BookId>, status: ReadingStatus) -> Self {
        Self {
            id: id.into(),
            book_id: book_id.into(),
            status,
            owned: false,
            priority: Priority::default(),
            rating: None,
            hooked: false,
            notes: None,
            rich_notes: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn is_reading(&self) -> bool {
        self.status == ReadingStatus::Reading
    }
}
