//! Infrastructure layer for vectable.
//!
//! Implements the catalog port from `vectable-core` on SQLite, applies
//! migration plans, runs the record store, and loads `vectable.toml`.

pub mod config;
pub mod sqlite;

pub use sqlite::migrator::{MigrationReport, Migrator};
pub use sqlite::pool::DatabasePool;
pub use sqlite::store::SqliteVectorStore;
