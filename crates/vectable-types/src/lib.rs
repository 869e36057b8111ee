//! Shared domain types for vectable.
//!
//! Schema declarations, stored records, filters, search options, and the
//! error taxonomy used across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, chrono, thiserror.

pub mod config;
pub mod error;
pub mod filter;
pub mod schema;
pub mod vector;
