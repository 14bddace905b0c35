//! [`RemoteStore`] backed by PostgreSQL and a filesystem cover bucket.

use crate::{
    config::Config,
    covers::CoverBucket,
    db::{self, Pool},
    error::StoreError,
};
use async_trait::async_trait;
use shelf_engine::{
    Book, BookPatch, EntryPatch, JoinedEntry, LibraryEntry, RemoteStore, SyncError, SyncResult,
};

/// The production store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Pool,
    covers: CoverBucket,
}

impl PgStore {
    pub fn new(pool: Pool, covers: CoverBucket) -> Self {
        Self { pool, covers }
    }

    /// Connect, migrate and open the cover bucket described by `config`.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let pool = db::create_pool(config).await?;
        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;

        let covers = CoverBucket::new(&config.cover_dir, &config.cover_public_url, &config.cover_bucket);
        Ok(Self::new(pool, covers))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

fn sync(context: &'static str) -> impl FnOnce(StoreError) -> SyncError {
    move |err| err.into_sync(context)
}

#[async_trait]
impl RemoteStore for PgStore {
    async fn insert_book(&self, book: &Book) -> SyncResult<()> {
        db::insert_book(&self.pool, book).await.map_err(sync("insert_book"))
    }

    async fn update_book(&self, book_id: &str, patch: &BookPatch) -> SyncResult<()> {
        db::update_book(&self.pool, book_id, patch)
            .await
            .map_err(sync("update_book"))
    }

    async fn delete_book(&self, book_id: &str) -> SyncResult<()> {
        db::delete_book(&self.pool, book_id).await.map_err(sync("delete_book"))
    }

    async fn insert_entry(&self, entry: &LibraryEntry) -> SyncResult<()> {
        db::insert_entry(&self.pool, entry).await.map_err(sync("insert_entry"))
    }

    async fn update_entry(&self, book_id: &str, patch: &EntryPatch) -> SyncResult<()> {
        db::update_entry(&self.pool, book_id, patch)
            .await
            .map_err(sync("update_entry"))
    }

    async fn delete_entry(&self, book_id: &str) -> SyncResult<()> {
        db::delete_entry(&self.pool, book_id).await.map_err(sync("delete_entry"))
    }

    async fn query_joined(&self, filter: Option<&str>) -> SyncResult<Vec<JoinedEntry>> {
        db::query_joined(&self.pool, filter).await.map_err(sync("query_joined"))
    }

    async fn upload_cover(&self, file_name: &str, bytes: Vec<u8>) -> SyncResult<String> {
        self.covers.put(file_name, &bytes).await.map_err(sync("upload_cover"))
    }

    async fn delete_cover(&self, path: &str) -> SyncResult<()> {
        self.covers.remove(path).await.map_err(sync("delete_cover"))
    }

    fn cover_bucket(&self) -> &str {
        self.covers.bucket()
    }
}
