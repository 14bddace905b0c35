//! Optimistic transactions over the library state.
//!
//! A transaction applies a patch to the in-memory state before the remote
//! call and remembers the inverse patch. If the remote call fails the inverse
//! is applied, restoring exactly the fields the transaction touched on that
//! one entry. Other entries, and other fields of the same entry, are left
//! alone, so unrelated operations can be in flight at the same time.
//!
//! A second transaction on the same field of the same entry must not start
//! before the first one resolves: its rollback would clobber the newer value.

use crate::{
    error::{Error, Result},
    BookId, BookPatch, EntryId, EntryPatch, LibraryEntry, LibraryState,
};

/// An optimistic change to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a transaction must be committed or rolled back"]
pub struct EntryTransaction {
    entry_id: EntryId,
    book_id: BookId,
    forward: EntryPatch,
    inverse: EntryPatch,
}

impl EntryTransaction {
    /// Plan a patch for `entry_id` and apply it to `state`.
    ///
    /// `plan` sees the whole state (for cross-entry rules) and the target
    /// entry; if it fails nothing is applied.
    pub fn begin<P>(state: &mut LibraryState, entry_id: &str, plan: P) -> Result<Self>
    where
        P: FnOnce(&LibraryState, &LibraryEntry) -> Result<EntryPatch>,
    {
        let entry = state
            .entry(entry_id)
            .ok_or_else(|| Error::EntryNotFound(entry_id.to_string()))?;
        let forward = plan(state, entry)?;
        let inverse = forward.inverse_for(entry);
        let book_id = entry.book_id.clone();

        if let Some(entry) = state.entry_mut(entry_id) {
            forward.apply_to(entry);
        }

        Ok(Self {
            entry_id: entry_id.to_string(),
            book_id,
            forward,
            inverse,
        })
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    /// The patch that was applied and must be persisted.
    pub fn patch(&self) -> &EntryPatch {
        &self.forward
    }

    /// Keep the optimistic state.
    pub fn commit(self) {}

    /// Put back the touched fields. A no-op if the entry has since vanished
    /// (e.g. a reload replaced the state).
    pub fn rollback(self, state: &mut LibraryState) {
        if let Some(entry) = state.entry_mut(&self.entry_id) {
            self.inverse.apply_to(entry);
        }
    }
}

/// An optimistic change to a book's metadata and its entry together.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a transaction must be committed or rolled back"]
pub struct PairTransaction {
    book_id: BookId,
    book_prior: BookPatch,
    entry: EntryTransaction,
}

impl PairTransaction {
    /// Apply `book` to `book_id` and the planned patch to its entry.
    pub fn begin<P>(state: &mut LibraryState, book_id: &str, book: &BookPatch, plan: P) -> Result<Self>
    where
        P: FnOnce(&LibraryState, &LibraryEntry) -> Result<EntryPatch>,
    {
        let book_prior = state
            .book(book_id)
            .map(BookPatch::capture)
            .ok_or_else(|| Error::BookNotFound(book_id.to_string()))?;
        let entry_id = state
            .entry_for_book(book_id)
            .map(|e| e.id.clone())
            .ok_or_else(|| Error::BookNotFound(book_id.to_string()))?;

        let entry = EntryTransaction::begin(state, &entry_id, plan)?;
        if let Some(cached) = state.book_mut(book_id) {
            book.apply_to(cached);
        }

        Ok(Self {
            book_id: book_id.to_string(),
            book_prior,
            entry,
        })
    }

    pub fn entry_patch(&self) -> &EntryPatch {
        self.entry.patch()
    }

    pub fn commit(self) {
        self.entry.commit();
    }

    pub fn rollback(self, state: &mut LibraryState) {
        if let Some(cached) = state.book_mut(&self.book_id) {
            self.book_prior.apply_to(cached);
        }
        self.entry.rollback(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapter::JoinedEntry, error::Violation, Book, ReadingStatus};

    fn state() -> LibraryState {
        LibraryState::from_joined(["a", "b"].map(|id| JoinedEntry {
            entry: LibraryEntry::new(format!("e-{id}"), format!("b-{id}"), ReadingStatus::Wishlist),
            book: Some(Book::new(format!("b-{id}"), id.to_uppercase(), "Author")),
        }))
    }

    fn set_notes(text: &str) -> EntryPatch {
        EntryPatch {
            notes: Some(Some(text.to_string())),
            ..EntryPatch::default()
        }
    }

    #[test]
    fn begin_applies_and_rollback_restores() {
        let mut state = state();
        let before = state.clone();

        let tx = EntryTransaction::begin(&mut state, "e-a", |_, _| Ok(set_notes("hi"))).unwrap();
        assert_eq!(tx.book_id(), "b-a");
        assert_eq!(state.entry("e-a").unwrap().notes.as_deref(), Some("hi"));

        tx.rollback(&mut state);
        assert_eq!(state, before);
    }

    #[test]
    fn failed_plan_applies_nothing() {
        let mut state = state();
        let before = state.clone();

        let result = EntryTransaction::begin(&mut state, "e-a", |_, _| {
            Err(Violation::RatingRequiresFinished.into())
        });
        assert!(matches!(result, Err(Error::Rejected(_))));
        assert_eq!(state, before);

        let missing = EntryTransaction::begin(&mut state, "nope", |_, _| Ok(set_notes("x")));
        assert_eq!(missing, Err(Error::EntryNotFound("nope".into())));
    }

    #[test]
    fn rollback_is_scoped_to_touched_fields() {
        let mut state = state();

        let first = EntryTransaction::begin(&mut state, "e-a", |_, _| Ok(set_notes("one"))).unwrap();
        let second = EntryTransaction::begin(&mut state, "e-a", |_, _| {
            Ok(EntryPatch {
                owned: Some(true),
                ..EntryPatch::default()
            })
        })
        .unwrap();

        first.rollback(&mut state);
        second.commit();

        let entry = state.entry("e-a").unwrap();
        assert_eq!(entry.notes, None);
        assert!(entry.owned);
    }

    #[test]
    fn pair_rollback_restores_book_and_entry() {
        let mut state = state();
        let before = state.clone();
        let patch = BookPatch {
            title: "Renamed".into(),
            author: "Someone".into(),
            cover_url: None,
            description: Some("new".into()),
        };

        let tx = PairTransaction::begin(&mut state, "b-b", &patch, |_, _| {
            Ok(EntryPatch {
                status: Some(ReadingStatus::Owned),
                owned: Some(true),
                ..EntryPatch::default()
            })
        })
        .unwrap();
        assert_eq!(state.book("b-b").unwrap().title, "Renamed");
        assert_eq!(state.entry("e-b").unwrap().status, ReadingStatus::Owned);

        tx.rollback(&mut state);
        assert_eq!(state, before);
    }
}
