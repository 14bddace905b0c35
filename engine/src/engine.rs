//! The library engine.
//!
//! [`LibraryEngine`] owns the cached library and is the only way to change
//! it. Every mutation follows the same shape:
//!
//! 1. validate against the current in-memory state (rejections touch nothing),
//! 2. apply optimistically, remembering what to undo,
//! 3. persist through the [`RemoteStore`],
//! 4. on failure undo and report a [`SyncError`](crate::SyncError).
//!
//! The internal lock is never held across a store call, so operations on
//! different entries may be in flight together. Callers must not issue a
//! second mutation of the same entry field before the first resolves.

use crate::{
    adapter::{cover_path, RemoteStore},
    clock::{Clock, SystemClock},
    error::{Error, Result, Violation},
    optimistic::{EntryTransaction, PairTransaction},
    status, BookForm, BookId, DateField, EntryPatch, LibraryEntry, LibraryState, LibraryStats,
    Rating, ReadingStatus,
};
use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Largest accepted cover upload, in bytes.
pub const MAX_COVER_BYTES: usize = 5 * 1024 * 1024;

/// File extensions accepted as cover images.
pub const COVER_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// Which book, if any, the add/edit form is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub open: bool,
    /// `None` while adding a new book
    pub editing: Option<BookId>,
}

#[derive(Debug, Default)]
struct Inner {
    library: LibraryState,
    loading: bool,
    last_error: Option<String>,
    form: FormState,
}

impl Inner {
    /// Record a failed operation and hand the error back.
    fn fail(&mut self, action: &str, err: Error) -> Error {
        match &err {
            Error::Rejected(violation) => {
                warn!(action, %violation, "mutation rejected");
                self.last_error = Some(violation.to_string());
            }
            Error::Sync(sync) => {
                warn!(action, error = %sync, "remote call failed");
                self.last_error = Some(format!("Failed to {action}."));
            }
            Error::EntryNotFound(_) | Error::BookNotFound(_) => {
                warn!(action, error = %err, "ignoring mutation of unknown record");
            }
        }
        err
    }
}

/// Optimistic, invariant-checking front end to a [`RemoteStore`].
pub struct LibraryEngine<S, C = SystemClock> {
    store: S,
    clock: C,
    inner: Mutex<Inner>,
}

impl<S: RemoteStore> LibraryEngine<S> {
    /// Create an engine using the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: RemoteStore, C: Clock> LibraryEngine<S, C> {
    /// Create an engine with an explicit date source.
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// Run `f` against the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&LibraryState) -> R) -> R {
        f(&self.inner.lock().library)
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> LibraryState {
        self.with_state(LibraryState::clone)
    }

    pub fn books(&self) -> Vec<crate::Book> {
        self.with_state(|s| s.books().to_vec())
    }

    pub fn entries(&self) -> Vec<LibraryEntry> {
        self.with_state(|s| s.entries().to_vec())
    }

    pub fn entry(&self, id: &str) -> Option<LibraryEntry> {
        self.with_state(|s| s.entry(id).cloned())
    }

    pub fn book(&self, id: &str) -> Option<crate::Book> {
        self.with_state(|s| s.book(id).cloned())
    }

    pub fn stats(&self) -> LibraryStats {
        self.with_state(LibraryState::stats)
    }

    /// Entries whose book title or author contains `query`, ignoring case.
    pub fn search_library(&self, query: &str) -> Vec<LibraryEntry> {
        self.with_state(|s| s.search(query).into_iter().cloned().collect())
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().loading
    }

    /// User-facing message for the most recent failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.inner.lock().last_error = None;
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Replace the cached library with the store's contents.
    ///
    /// With a filter, only books whose title or author matches are loaded. On
    /// failure the previous state is kept intact.
    pub async fn load_all(&self, filter: Option<&str>) -> Result<()> {
        self.inner.lock().loading = true;
        let result = self.store.query_joined(filter).await;

        let mut inner = self.inner.lock();
        inner.loading = false;
        match result {
            Ok(rows) => {
                inner.library = LibraryState::from_joined(rows);
                inner.last_error = None;
                info!(entries = inner.library.len(), filter, "library loaded");
                Ok(())
            }
            Err(err) => Err(inner.fail("load library data", err.into())),
        }
    }

    // -----------------------------------------------------------------------
    // Entry mutations
    // -----------------------------------------------------------------------

    /// Move an entry to `new_status`, applying the status rules.
    pub async fn update_status(&self, entry_id: &str, new_status: ReadingStatus) -> Result<()> {
        let today = self.clock.today();
        self.commit_entry("update status", entry_id, |state, entry| {
            status::check_reading_capacity(state.entries(), Some(entry.id.as_str()), new_status)?;
            Ok(status::status_change(entry, new_status, today))
        })
        .await
    }

    /// Rate a finished entry, 1 to 5.
    pub async fn update_rating(&self, entry_id: &str, rating: i64) -> Result<()> {
        let rating = match Rating::try_from(rating) {
            Ok(rating) => rating,
            Err(violation) => return Err(self.fail("update rating", violation.into())),
        };
        self.commit_entry("update rating", entry_id, |_, entry| {
            if entry.status != ReadingStatus::Finished {
                return Err(Violation::RatingRequiresFinished.into());
            }
            Ok(EntryPatch {
                rating: Some(Some(rating)),
                ..EntryPatch::default()
            })
        })
        .await
    }

    /// Set or clear a tracking date. Any date is accepted, including clearing.
    pub async fn update_date(
        &self,
        entry_id: &str,
        field: DateField,
        value: Option<NaiveDate>,
    ) -> Result<()> {
        self.commit_entry("update date", entry_id, |_, _| {
            Ok(EntryPatch::date(field, value))
        })
        .await
    }

    /// Replace the plain-text notes. Blank text clears them.
    pub async fn update_notes(&self, entry_id: &str, notes: Option<String>) -> Result<()> {
        let notes = notes.filter(|n| !n.is_empty());
        self.commit_entry("update notes", entry_id, |_, _| {
            Ok(EntryPatch {
                notes: Some(notes),
                ..EntryPatch::default()
            })
        })
        .await
    }

    /// Replace the serialized rich-notes document. Blank text clears it.
    pub async fn update_rich_notes(&self, entry_id: &str, rich_notes: Option<String>) -> Result<()> {
        let rich_notes = rich_notes.filter(|n| !n.is_empty());
        self.commit_entry("update rich notes", entry_id, |_, _| {
            Ok(EntryPatch {
                rich_notes: Some(rich_notes),
                ..EntryPatch::default()
            })
        })
        .await
    }

    /// Flip `owned`, moving `wishlist <-> owned` alongside.
    pub async fn toggle_owned(&self, entry_id: &str) -> Result<()> {
        self.commit_entry("update ownership", entry_id, |_, entry| {
            Ok(status::ownership_toggle(entry))
        })
        .await
    }

    /// Plan, apply, persist and (on failure) roll back one entry patch.
    async fn commit_entry<P>(&self, action: &str, entry_id: &str, plan: P) -> Result<()>
    where
        P: FnOnce(&LibraryState, &LibraryEntry) -> Result<EntryPatch>,
    {
        let tx = {
            let mut inner = self.inner.lock();
            inner.last_error = None;
            match EntryTransaction::begin(&mut inner.library, entry_id, plan) {
                Ok(tx) => tx,
                Err(err) => return Err(inner.fail(action, err)),
            }
        };

        let fields: Vec<_> = tx.patch().fields().iter().map(|f| f.as_str()).collect();
        debug!(action, entry_id, ?fields, "applied optimistically");

        match self.store.update_entry(tx.book_id(), tx.patch()).await {
            Ok(()) => {
                tx.commit();
                Ok(())
            }
            Err(err) => {
                let mut inner = self.inner.lock();
                tx.rollback(&mut inner.library);
                Err(inner.fail(action, err.into()))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Book lifecycle
    // -----------------------------------------------------------------------

    /// Add a new book and its entry.
    ///
    /// The book is inserted first; if the entry insert fails the book is
    /// deleted again so no orphan remains. The pair only appears locally once
    /// both inserts succeed, at the front of the library.
    pub async fn create_book(&self, form: &BookForm) -> Result<BookId> {
        let form = {
            let mut inner = self.inner.lock();
            inner.last_error = None;
            let checked = form.validate().and_then(|form| {
                status::check_reading_capacity(inner.library.entries(), None, form.status)?;
                Ok(form)
            });
            match checked {
                Ok(form) => form,
                Err(violation) => return Err(inner.fail("save book", violation.into())),
            }
        };

        let book_id = Uuid::new_v4().to_string();
        let entry_id = Uuid::new_v4().to_string();
        let book = form.new_book(book_id.clone());
        let entry = form.new_entry(entry_id, book_id.clone(), self.clock.today());

        if let Err(err) = self.store.insert_book(&book).await {
            return Err(self.fail("save book", err.into()));
        }

        if let Err(err) = self.store.insert_entry(&entry).await {
            if let Err(cleanup) = self.store.delete_book(&book_id).await {
                error!(%book_id, error = %cleanup, "failed to remove book after entry insert failed");
            }
            return Err(self.fail("save book", err.into()));
        }

        info!(%book_id, title = %book.title, "book added");
        self.inner.lock().library.prepend(book, entry);
        Ok(book_id)
    }

    /// Edit a book's metadata and its entry's tracking fields.
    ///
    /// Both are applied optimistically and rolled back together if either
    /// store call fails. Dates are stamped per the edit rule and never
    /// cleared.
    pub async fn update_book_and_entry(&self, book_id: &str, form: &BookForm) -> Result<()> {
        let today = self.clock.today();
        let (form, tx) = {
            let mut inner = self.inner.lock();
            inner.last_error = None;
            let begun = form.validate().map_err(Error::from).and_then(|form| {
                let tx = PairTransaction::begin(
                    &mut inner.library,
                    book_id,
                    &form.book_patch(),
                    |state, entry| {
                        status::check_reading_capacity(state.entries(), Some(entry.id.as_str()), form.status)?;
                        Ok(form.entry_patch(entry, today))
                    },
                )?;
                Ok((form, tx))
            });
            match begun {
                Ok(begun) => begun,
                Err(err) => return Err(inner.fail("save book", err)),
            }
        };

        let persisted = match self.store.update_book(book_id, &form.book_patch()).await {
            Ok(()) => self.store.update_entry(book_id, tx.entry_patch()).await,
            Err(err) => Err(err),
        };

        match persisted {
            Ok(()) => {
                tx.commit();
                info!(%book_id, "book updated");
                Ok(())
            }
            Err(err) => {
                let mut inner = self.inner.lock();
                tx.rollback(&mut inner.library);
                Err(inner.fail("save book", err.into()))
            }
        }
    }

    /// Create when `book_id` is `None`, otherwise edit.
    pub async fn create_or_update_book(&self, book_id: Option<&str>, form: &BookForm) -> Result<BookId> {
        match book_id {
            Some(id) => {
                self.update_book_and_entry(id, form).await?;
                Ok(id.to_string())
            }
            None => self.create_book(form).await,
        }
    }

    /// Delete a book, its entry and (best effort) its cover.
    ///
    /// The entry goes first so the book is never left referenced. Local state
    /// changes only after both deletes succeed.
    pub async fn delete_book(&self, book_id: &str) -> Result<()> {
        let cover_url = {
            let mut inner = self.inner.lock();
            inner.last_error = None;
            let cover_url = inner.library.book(book_id).map(|book| book.cover_url.clone());
            match cover_url {
                Some(url) => url,
                None => {
                    return Err(inner.fail("delete book", Error::BookNotFound(book_id.to_string())))
                }
            }
        };

        if let Err(err) = self.store.delete_entry(book_id).await {
            return Err(self.fail("delete book", err.into()));
        }
        if let Err(err) = self.store.delete_book(book_id).await {
            return Err(self.fail("delete book", err.into()));
        }

        self.inner.lock().library.remove_book(book_id);
        info!(%book_id, "book deleted");

        if let Some(url) = cover_url {
            self.discard_cover(&url).await;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Covers
    // -----------------------------------------------------------------------

    /// Upload a cover image and return its public URL.
    ///
    /// The stored name is a fresh UUID keeping the original extension.
    pub async fn upload_cover(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        self.clear_error();
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !COVER_EXTENSIONS.contains(&extension.as_str()) {
            let violation = Violation::UnsupportedCoverType(file_name.to_string());
            return Err(self.fail("upload cover", violation.into()));
        }
        if bytes.len() > MAX_COVER_BYTES {
            let violation = Violation::CoverTooLarge {
                size: bytes.len(),
                limit: MAX_COVER_BYTES,
            };
            return Err(self.fail("upload cover", violation.into()));
        }

        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
        match self.store.upload_cover(&stored_name, bytes).await {
            Ok(url) => {
                debug!(%url, "cover uploaded");
                Ok(url)
            }
            Err(err) => Err(self.fail("upload cover", err.into())),
        }
    }

    /// Remove a stored cover. Failures are logged, never returned.
    pub async fn discard_cover(&self, url: &str) {
        let Some(path) = cover_path(url, self.store.cover_bucket()) else {
            warn!(%url, "cover URL is not in the cover bucket; skipping delete");
            return;
        };
        if let Err(err) = self.store.delete_cover(&path).await {
            error!(%path, error = %err, "failed to delete cover");
        }
    }

    // -----------------------------------------------------------------------
    // Form intent
    // -----------------------------------------------------------------------

    /// Open the add form (`None`) or the edit form for `book_id`.
    pub fn open_form(&self, book_id: Option<&str>) {
        self.inner.lock().form = FormState {
            open: true,
            editing: book_id.map(str::to_string),
        };
    }

    pub fn close_form(&self) {
        self.inner.lock().form = FormState::default();
    }

    pub fn form_state(&self) -> FormState {
        self.inner.lock().form.clone()
    }

    /// The pre-filled form for the book being edited.
    pub fn editing(&self) -> Option<BookForm> {
        let inner = self.inner.lock();
        let book_id = inner.form.editing.as_deref()?;
        let book = inner.library.book(book_id)?;
        let entry = inner.library.entry_for_book(book_id)?;
        Some(BookForm::from_existing(book, entry))
    }

    /// Save the open form and close it on success.
    pub async fn submit_form(&self, form: &BookForm) -> Result<BookId> {
        let editing = self.form_state().editing;
        let book_id = self.create_or_update_book(editing.as_deref(), form).await?;
        self.close_form();
        Ok(book_id)
    }

    fn fail(&self, action: &str, err: Error) -> Error {
        self.inner.lock().fail(action, err)
    }
}

impl<S, C> std::fmt::Debug for LibraryEngine<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LibraryEngine")
            .field("entries", &inner.library.len())
            .field("loading", &inner.loading)
            .field("last_error", &inner.last_error)
            .finish_non_exhaustive()
    }
}
