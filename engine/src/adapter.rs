//! The remote store boundary.
//!
//! [`RemoteStore`] is a typed façade over the persistent store: two record
//! types (books and library entries) plus a bucket of cover images. It speaks
//! only domain types. Implementations own the mapping to their storage shape
//! and must convert every provider failure into a [`SyncError`]; nothing else
//! may escape.

use crate::{error::SyncResult, Book, BookId, BookPatch, EntryPatch, LibraryEntry};
use async_trait::async_trait;

/// Logical bucket for cover images when the store does not name one.
pub const DEFAULT_COVER_BUCKET: &str = "book";

/// An entry row joined with its book row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedEntry {
    pub entry: LibraryEntry,
    /// `None` if the referenced book row is missing
    pub book: Option<Book>,
}

/// Record-shaped operations against the persistent store.
///
/// Entry updates and deletes are keyed by the owning book id, matching the
/// one-to-one book/entry relationship.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn insert_book(&self, book: &Book) -> SyncResult<()>;

    async fn update_book(&self, book_id: &str, patch: &BookPatch) -> SyncResult<()>;

    async fn delete_book(&self, book_id: &str) -> SyncResult<()>;

    async fn insert_entry(&self, entry: &LibraryEntry) -> SyncResult<()>;

    /// Write only the fields present in `patch`. An empty patch is a no-op.
    async fn update_entry(&self, book_id: &str, patch: &EntryPatch) -> SyncResult<()>;

    /// Delete every entry referencing `book_id`.
    async fn delete_entry(&self, book_id: &str) -> SyncResult<()>;

    /// All entries joined with their books, newest first, optionally
    /// restricted to books whose title or author contains `filter`.
    async fn query_joined(&self, filter: Option<&str>) -> SyncResult<Vec<JoinedEntry>>;

    /// Store a cover image under `file_name` and return its public URL.
    async fn upload_cover(&self, file_name: &str, bytes: Vec<u8>) -> SyncResult<String>;

    /// Delete a cover by its path inside the bucket.
    async fn delete_cover(&self, path: &str) -> SyncResult<()>;

    /// Bucket that cover URLs are issued under.
    fn cover_bucket(&self) -> &str {
        DEFAULT_COVER_BUCKET
    }
}

#[async_trait]
impl<S: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<S> {
    async fn insert_book(&self, book: &Book) -> SyncResult<()> {
        (**self).insert_book(book).await
    }

    async fn update_book(&self, book_id: &str, patch: &BookPatch) -> SyncResult<()> {
        (**self).update_book(book_id, patch).await
    }

    async fn delete_book(&self, book_id: &str) -> SyncResult<()> {
        (**self).delete_book(book_id).await
    }

    async fn insert_entry(&self, entry: &LibraryEntry) -> SyncResult<()> {
        (**self).insert_entry(entry).await
    }

    async fn update_entry(&self, book_id: &str, patch: &EntryPatch) -> SyncResult<()> {
        (**self).update_entry(book_id, patch).await
    }

    async fn delete_entry(&self, book_id: &str) -> SyncResult<()> {
        (**self).delete_entry(book_id).await
    }

    async fn query_joined(&self, filter: Option<&str>) -> SyncResult<Vec<JoinedEntry>> {
        (**self).query_joined(filter).await
    }

    async fn upload_cover(&self, file_name: &str, bytes: Vec<u8>) -> SyncResult<String> {
        (**self).upload_cover(file_name, bytes).await
    }

    async fn delete_cover(&self, path: &str) -> SyncResult<()> {
        (**self).delete_cover(path).await
    }

    fn cover_bucket(&self) -> &str {
        (**self).cover_bucket()
    }
}

/// Extract the in-bucket path from a public cover URL.
///
/// The path is everything after the first `/<bucket>/` segment of the URL
/// path, e.g. `https://cdn.example/storage/book/ab12.jpg` gives `ab12.jpg`.
/// Query strings and fragments are ignored. Returns `None` if the bucket does
/// not appear or nothing follows it.
pub fn cover_path(url: &str, bucket: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .split_once('/')
        .map_or("", |(_, path)| path)
        .split(['?', '#'])
        .next()
        .unwrap_or("");

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let index = segments.iter().position(|s| *s == bucket)?;
    let rest = &segments[index + 1..];
    (!rest.is_empty()).then(|| rest.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_path_after_bucket() {
        assert_eq!(
            cover_path("https://x.supabase.co/storage/v1/object/public/book/abc.jpg", "book"),
            Some("abc.jpg".into())
        );
        assert_eq!(
            cover_path("http://localhost:8080/storage/book/nested/abc.png?v=2", "book"),
            Some("nested/abc.png".into())
        );
    }

    #[test]
    fn cover_path_requires_bucket() {
        assert_eq!(cover_path("https://cdn.example/images/abc.jpg", "book"), None);
        assert_eq!(cover_path("https://cdn.example/book/", "book"), None);
        assert_eq!(cover_path("not a url", "book"), None);
    }

    #[test]
    fn host_is_not_a_bucket() {
        assert_eq!(cover_path("https://book/other/abc.jpg", "book"), None);
    }
}
