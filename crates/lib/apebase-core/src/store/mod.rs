//! Store interfaces and `SurrealDB` implementation.
//!
//! The store layer handles persistence of token documents and the replay of
//! `NeDB` datafiles into it.

pub mod nedb;
pub mod surreal;

pub use nedb::{Datafile, load_datafile, parse_datafile};
pub use surreal::{StoreError, StoreResult, SurrealTokenStore};
