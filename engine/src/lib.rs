//! # Shelf Engine
//!
//! The library state and sync engine for a personal reading tracker.
//!
//! The engine keeps an optimistic in-memory view of a user's books and their
//! reading state, persists every change to a remote store, and enforces the
//! domain rules the store itself does not know about.
//!
//! ## Design Principles
//!
//! - **Optimistic**: changes show up locally before the store confirms them
//! - **Validated first**: rule violations are rejected without touching state
//! - **Scoped rollback**: a failed store call restores only what it changed
//! - **Store-agnostic**: the engine talks to a [`RemoteStore`] trait and never
//!   sees storage field names
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Book`] holds metadata; its [`LibraryEntry`] holds the tracking fields.
//! They are created and deleted together.
//!
//! ### Status Rules
//!
//! The [`status`] module encodes the invariants: at most two books
//! `reading`, wishlist books are never owned, only finished books are rated,
//! finishing and starting stamp dates, and ownership toggles move
//! `wishlist <-> owned`.
//!
//! ### Optimistic Transactions
//!
//! [`EntryTransaction`] applies an [`EntryPatch`] and remembers its inverse.
//! The same patch is what gets sent to the store.
//!
//! ## Quick Start
//!
//! ```rust
//! use shelf_engine::{
//!     BookForm, FixedClock, InMemoryStore, LibraryEngine, ReadingStatus,
//! };
//!
//! # tokio_test_block_on(async {
//! let clock = FixedClock::ymd(2025, 6, 1).unwrap();
//! let engine = LibraryEngine::with_clock(InMemoryStore::new(), clock);
//!
//! // 1. Add a book
//! let mut form = BookForm::new("Project Hail Mary", "Andy Weir");
//! form.status = ReadingStatus::Owned;
//! form.owned = true;
//! let book_id = engine.create_book(&form).await.unwrap();
//!
//! // 2. Start reading it
//! let entry_id = engine.entries()[0].id.clone();
//! engine.update_status(&entry_id, ReadingStatus::Reading).await.unwrap();
//!
//! let entry = engine.entry(&entry_id).unwrap();
//! assert_eq!(entry.book_id, book_id);
//! assert_eq!(entry.started_at.unwrap().to_string(), "2025-06-01");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod adapter;
pub mod clock;
pub mod engine;
pub mod error;
pub mod form;
pub mod memory;
pub mod optimistic;
pub mod patch;
pub mod query;
pub mod record;
pub mod state;
pub mod status;

// Re-export main types at crate root
pub use adapter::{cover_path, JoinedEntry, RemoteStore, DEFAULT_COVER_BUCKET};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{FormState, LibraryEngine, COVER_EXTENSIONS, MAX_COVER_BYTES};
pub use error::{Error, Result, SyncError, SyncResult, Violation};
pub use form::BookForm;
pub use memory::{InMemoryStore, StoreCall};
pub use optimistic::{EntryTransaction, PairTransaction};
pub use patch::{BookPatch, DateField, EntryField, EntryPatch};
pub use query::{LibraryQuery, Ownership, SortOrder};
pub use record::{Book, LibraryEntry, Priority, Rating, ReadingStatus};
pub use state::{LibraryState, LibraryStats};
pub use status::MAX_READING;

/// Type aliases for clarity
pub type BookId = String;
pub type EntryId = String;
