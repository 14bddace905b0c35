//! # Shelf Store
//!
//! Persistence for the Shelf reading tracker: a PostgreSQL implementation of
//! [`shelf_engine::RemoteStore`] plus a filesystem bucket for cover images.
//!
//! ```no_run
//! use shelf_engine::LibraryEngine;
//! use shelf_store::{Config, PgStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let engine = LibraryEngine::new(PgStore::connect(&config).await?);
//! engine.load_all(None).await?;
//! println!("{} books", engine.books().len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod covers;
pub mod db;
pub mod error;
pub mod postgres;

pub use config::{Config, ConfigError};
pub use covers::CoverBucket;
pub use error::{Result, StoreError};
pub use postgres::PgStore;
