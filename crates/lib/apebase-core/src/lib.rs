//! Core services for the apebase viewer.
//!
//! This crate owns filter validation and page arithmetic, the image reference
//! normalizer, the query control plane, and the `SurrealDB` backing store
//! populated from an `NeDB` datafile.

pub mod control;
pub mod normalize;
pub mod query;
pub mod store;
