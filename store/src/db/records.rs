//! Database operations for the `books` and `library` tables.

use crate::error::{Result, StoreError};
use chrono::NaiveDate;
use shelf_engine::{
    Book, BookPatch, EntryPatch, JoinedEntry, LibraryEntry, Priority, Rating, ReadingStatus,
};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};

/// A stored book row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBook {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover_url: Option<String>,
    pub description: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredBook {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(StoredBook {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            author: row.try_get("author")?,
            cover_url: row.try_get("cover_url")?,
            description: row.try_get("description")?,
        })
    }
}

impl StoredBook {
    /// Convert database row to a domain book.
    pub fn to_book(&self) -> Book {
        Book {
            id: self.id.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            cover_url: self.cover_url.clone(),
            description: self.description.clone(),
        }
    }
}

/// A stored library entry row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub id: String,
    pub book_id: String,
    pub status: String,
    pub owned: bool,
    pub priority: i32,
    pub rating: Option<i32>,
    pub hooked: bool,
    pub notes: Option<String>,
    pub rich_notes: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredEntry {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(StoredEntry {
            id: row.try_get("id")?,
            book_id: row.try_get("book_id")?,
            status: row.try_get("status")?,
            owned: row.try_get("owned")?,
            priority: row.try_get("priority")?,
            rating: row.try_get("rating")?,
            hooked: row.try_get("hooked")?,
            notes: row.try_get("notes")?,
            rich_notes: row.try_get("rich_notes")?,
            started_at: row.try_get("started_at")?,
            finished_at: row.try_get("finished_at")?,
        })
    }
}

impl StoredEntry {
    /// Convert database row to a domain entry, validating every column the
    /// database stores loosely.
    pub fn to_entry(&self) -> Result<LibraryEntry> {
        let status = self
            .status
            .parse::<ReadingStatus>()
            .map_err(|e| StoreError::malformed(&self.id, "status", e))?;
        let priority = Priority::try_from(i64::from(self.priority))
            .map_err(|e| StoreError::malformed(&self.id, "priority", e))?;
        let rating = self
            .rating
            .map(|r| Rating::try_from(i64::from(r)))
            .transpose()
            .map_err(|e| StoreError::malformed(&self.id, "rating", e))?;

        Ok(LibraryEntry {
            id: self.id.clone(),
            book_id: self.book_id.clone(),
            status,
            owned: self.owned,
            priority,
            rating,
            hooked: self.hooked,
            notes: self.notes.clone(),
            rich_notes: self.rich_notes.clone(),
            started_at: parse_date(&self.id, "started_at", self.started_at.as_deref())?,
            finished_at: parse_date(&self.id, "finished_at", self.finished_at.as_deref())?,
        })
    }
}

/// An entry row left-joined with its book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredJoinedRow {
    pub entry: StoredEntry,
    /// `None` if the book row is missing
    pub book: Option<StoredBook>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredJoinedRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        let entry = StoredEntry::from_row(row)?;
        let book_id: Option<String> = row.try_get("b_id")?;
        let book = match book_id {
            Some(id) => Some(StoredBook {
                id,
                title: row.try_get("b_title")?,
                author: row.try_get("b_author")?,
                cover_url: row.try_get("b_cover_url")?,
                description: row.try_get("b_description")?,
            }),
            None => None,
        };
        Ok(StoredJoinedRow { entry, book })
    }
}

impl StoredJoinedRow {
    pub fn to_joined(&self) -> Result<JoinedEntry> {
        Ok(JoinedEntry {
            entry: self.entry.to_entry()?,
            book: self.book.as_ref().map(StoredBook::to_book),
        })
    }
}

/// Dates are stored as ISO `YYYY-MM-DD` text. Blank counts as unset.
fn parse_date(row_id: &str, column: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|e| StoreError::malformed(row_id, column, format!("{text:?}: {e}"))),
    }
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

/// Escape `%`, `_` and `\` so `text` matches literally inside an `ILIKE`
/// pattern, then wrap it for a substring match.
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Insert a book row.
pub async fn insert_book(pool: &PgPool, book: &Book) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO books (id, title, author, cover_url, description)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&book.id)
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.cover_url)
    .bind(&book.description)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite a book's editable metadata.
pub async fn update_book(pool: &PgPool, book_id: &str, patch: &BookPatch) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE books
        SET title = $2, author = $3, cover_url = $4, description = $5
        WHERE id = $1
        "#,
    )
    .bind(book_id)
    .bind(&patch.title)
    .bind(&patch.author)
    .bind(&patch.cover_url)
    .bind(&patch.description)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_book(pool: &PgPool, book_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM books WHERE id = $1")
        .bind(book_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Insert a library entry row.
pub async fn insert_entry(pool: &PgPool, entry: &LibraryEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO library (
            id, book_id, status, owned, priority, rating, hooked,
            notes, rich_notes, started_at, finished_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.book_id)
    .bind(entry.status.as_str())
    .bind(entry.owned)
    .bind(i32::from(entry.priority.get()))
    .bind(entry.rating.map(|r| i32::from(r.get())))
    .bind(entry.hooked)
    .bind(&entry.notes)
    .bind(&entry.rich_notes)
    .bind(format_date(entry.started_at))
    .bind(format_date(entry.finished_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Build the `UPDATE` for the columns `patch` touches, or `None` if it
/// touches nothing.
pub fn entry_update_query<'a>(book_id: &'a str, patch: &EntryPatch) -> Option<QueryBuilder<'a, Postgres>> {
    if patch.is_empty() {
        return None;
    }

    let mut query = QueryBuilder::new("UPDATE library SET ");
    {
        let mut set = query.separated(", ");
        if let Some(status) = patch.status {
            set.push("status = ");
            set.push_bind_unseparated(status.as_str());
        }
        if let Some(owned) = patch.owned {
            set.push("owned = ");
            set.push_bind_unseparated(owned);
        }
        if let Some(priority) = patch.priority {
            set.push("priority = ");
            set.push_bind_unseparated(i32::from(priority.get()));
        }
        if let Some(rating) = patch.rating {
            set.push("rating = ");
            set.push_bind_unseparated(rating.map(|r| i32::from(r.get())));
        }
        if let Some(hooked) = patch.hooked {
            set.push("hooked = ");
            set.push_bind_unseparated(hooked);
        }
        if let Some(notes) = &patch.notes {
            set.push("notes = ");
            set.push_bind_unseparated(notes.clone());
        }
        if let Some(rich_notes) = &patch.rich_notes {
            set.push("rich_notes = ");
            set.push_bind_unseparated(rich_notes.clone());
        }
        if let Some(started_at) = patch.started_at {
            set.push("started_at = ");
            set.push_bind_unseparated(format_date(started_at));
        }
        if let Some(finished_at) = patch.finished_at {
            set.push("finished_at = ");
            set.push_bind_unseparated(format_date(finished_at));
        }
    }
    query.push(" WHERE book_id = ").push_bind(book_id);
    Some(query)
}

/// Write the touched columns of the entry owned by `book_id`.
pub async fn update_entry(pool: &PgPool, book_id: &str, patch: &EntryPatch) -> Result<()> {
    let Some(mut query) = entry_update_query(book_id, patch) else {
        return Ok(());
    };
    query.build().execute(pool).await?;
    Ok(())
}

/// Delete the entries referencing `book_id`.
pub async fn delete_entry(pool: &PgPool, book_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM library WHERE book_id = $1")
        .bind(book_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Build the joined library query, newest entries first.
pub fn joined_query(filter: Option<&str>) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(
        r#"
        SELECT l.id, l.book_id, l.status, l.owned, l.priority, l.rating, l.hooked,
               l.notes, l.rich_notes, l.started_at, l.finished_at,
               b.id AS b_id, b.title AS b_title, b.author AS b_author,
               b.cover_url AS b_cover_url, b.description AS b_description
        FROM library l
        LEFT JOIN books b ON b.id = l.book_id
        "#,
    );

    if let Some(text) = filter.map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(text);
        query
            .push("WHERE b.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR b.author ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\' ");
    }

    query.push("ORDER BY l.created_at DESC, l.id");
    query
}

/// Fetch every entry with its book, optionally filtered by title or author.
pub async fn query_joined(pool: &PgPool, filter: Option<&str>) -> Result<Vec<JoinedEntry>> {
    let rows: Vec<StoredJoinedRow> = joined_query(filter).build_query_as().fetch_all(pool).await?;
    rows.iter().map(StoredJoinedRow::to_joined).collect()
}
