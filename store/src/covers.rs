//! Filesystem-backed cover bucket.
//!
//! Covers live at `<cover_dir>/<bucket>/<path>` and are served publicly at
//! `<public_url>/<bucket>/<path>`. Paths handed in from outside are checked so
//! they can never leave the bucket directory.

use crate::error::{Result, StoreError};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CoverBucket {
    root: PathBuf,
    public_url: String,
    bucket: String,
}

impl CoverBucket {
    pub fn new(cover_dir: impl AsRef<Path>, public_url: &str, bucket: &str) -> Self {
        Self {
            root: cover_dir.as_ref().join(bucket),
            public_url: public_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL for a path inside the bucket.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}/{}", self.public_url, self.bucket, path)
    }

    /// Map an in-bucket path to a file under the bucket directory.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let plain = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !plain {
            return Err(StoreError::InvalidCoverPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Write `bytes` at `path` and return the public URL.
    pub async fn put(&self, path: &str, bytes: &[u8]) -> Result<String> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file, bytes).await?;
        debug!(file = %file.display(), size = bytes.len(), "cover written");
        Ok(self.url_for(path))
    }

    /// Delete the cover at `path`. A missing file is not an error.
    pub async fn remove(&self, path: &str) -> Result<()> {
        let file = self.resolve(path)?;
        match tokio::fs::remove_file(&file).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(file = %file.display(), "cover already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_engine::cover_path;

    fn bucket(dir: &Path) -> CoverBucket {
        CoverBucket::new(dir, "http://localhost:8080/storage/", "book")
    }

    #[test]
    fn url_round_trips_through_cover_path() {
        let dir = tempfile::tempdir().unwrap();
        let covers = bucket(dir.path());
        let url = covers.url_for("abc.jpg");
        assert_eq!(url, "http://localhost:8080/storage/book/abc.jpg");
        assert_eq!(cover_path(&url, covers.bucket()), Some("abc.jpg".into()));
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let covers = bucket(dir.path());
        for path in ["", "../secret", "/etc/passwd", "a/../../b", "./x.jpg"] {
            assert!(
                matches!(covers.resolve(path), Err(StoreError::InvalidCoverPath(_))),
                "{path} should be rejected"
            );
        }
        assert_eq!(
            covers.resolve("nested/abc.png").unwrap(),
            dir.path().join("book").join("nested/abc.png")
        );
    }

    #[tokio::test]
    async fn put_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let covers = bucket(dir.path());

        covers.put("abc.png", b"png").await.unwrap();
        let file = dir.path().join("book/abc.png");
        assert_eq!(tokio::fs::read(&file).await.unwrap(), b"png");

        covers.remove("abc.png").await.unwrap();
        assert!(!file.exists());

        // Second delete finds nothing and still succeeds.
        covers.remove("abc.png").await.unwrap();
    }
}
