//! Error types for the Shelf engine.

use crate::{BookId, EntryId};
use thiserror::Error;

/// A domain rule that a mutation would break.
///
/// The `Display` text is shown to the user as-is, so it names the rule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("You cannot have more than {limit} books 'reading' at the same time.")]
    TooManyReading { limit: usize },

    #[error("Only finished books can be rated.")]
    RatingRequiresFinished,

    #[error("Rating must be between 1 and 5, got {0}.")]
    RatingOutOfRange(i64),

    #[error("Priority must be between 1 and 5, got {0}.")]
    PriorityOutOfRange(i64),

    #[error("Title is required.")]
    EmptyTitle,

    #[error("Author is required.")]
    EmptyAuthor,

    #[error("Unknown reading status '{0}'.")]
    UnknownStatus(String),

    #[error("Please upload an image file (got '{0}').")]
    UnsupportedCoverType(String),

    #[error("Image size must be less than {limit} bytes (got {size}).")]
    CoverTooLarge { size: usize, limit: usize },
}

/// A remote store call failed.
///
/// Every [`RemoteStore`](crate::RemoteStore) method reports failures with this
/// type; provider errors never cross the adapter boundary in any other shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{context}: {message}")]
pub struct SyncError {
    /// The store operation that failed, e.g. `update_entry`
    pub context: String,
    /// The underlying provider message
    pub message: String,
}

impl SyncError {
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// All possible errors from engine operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Rejected locally; no state was touched.
    #[error("rejected: {0}")]
    Rejected(#[from] Violation),

    /// The remote call failed and the optimistic change was rolled back.
    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("book not found: {0}")]
    BookNotFound(BookId),
}

impl Error {
    /// The violated rule, if this is a local rejection.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Error::Rejected(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_sync(&self) -> bool {
        matches!(self, Error::Sync(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::EntryNotFound(_) | Error::BookNotFound(_))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for remote store calls.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
