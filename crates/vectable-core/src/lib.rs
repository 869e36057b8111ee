//! Backend-agnostic logic for vectable.
//!
//! Defines the catalog port that the infrastructure layer implements, plus
//! the pure pieces of the store: migration planning, the embedding codec,
//! similarity scoring, and record validation/ranking. Depends only on
//! `vectable-types` -- never on `vectable-infra` or any database crate.

pub mod catalog;
pub mod codec;
pub mod migrate;
pub mod record;
pub mod similarity;
