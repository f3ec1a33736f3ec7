//! Storage models and schema constants for the apebase viewer.
//!
//! This crate defines the record shape shared by the store, the query
//! service, and the HTTP layer.

pub mod models;
pub mod schema;

pub use models::*;
