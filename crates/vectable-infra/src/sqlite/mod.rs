//! SQLite storage layer.
//!
//! Catalog, migrator, and vector store backed by SQLite with WAL mode and
//! split read/write connection pools.

pub mod catalog;
pub mod migrator;
pub mod pool;
pub mod store;
mod value;
