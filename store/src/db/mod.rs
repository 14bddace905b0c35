//! Database module for PostgreSQL persistence.

mod pool;
mod records;

pub use pool::*;
pub use records::*;
