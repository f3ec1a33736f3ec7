use std::{error::Error, fmt, sync::Arc};

use surrealdb::{Connection, Surreal};

use crate::query::ValidationError;
use crate::store::{StoreError, SurrealTokenStore};

pub mod import;
pub mod query;

pub use import::ImportReport;
pub use query::TokenPage;

#[derive(Debug)]
pub enum ControlError {
    /// Caller input was malformed; the store was not touched.
    Validation(ValidationError),
    /// The store failed while answering a read.
    Query(StoreError),
    /// The store failed while loading documents.
    Import(StoreError),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "query failed: {err}"),
            Self::Import(err) => write!(f, "import failed: {err}"),
        }
    }
}

impl Error for ControlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Query(err) | Self::Import(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ControlError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<StoreError> for ControlError {
    fn from(err: StoreError) -> Self {
        Self::Query(err)
    }
}

/// Query service over the token collection.
///
/// Cheap to clone; every clone shares the same database handle.
pub struct TokenControlPlane<C: Connection> {
    store: SurrealTokenStore<C>,
}

impl<C: Connection> Clone for TokenControlPlane<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<C: Connection> TokenControlPlane<C> {
    #[must_use]
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            store: SurrealTokenStore::new(db),
        }
    }

    #[must_use]
    pub const fn from_arc(db: Arc<Surreal<C>>) -> Self {
        Self {
            store: SurrealTokenStore::from_arc(db),
        }
    }

    #[must_use]
    pub const fn with_store(store: SurrealTokenStore<C>) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &SurrealTokenStore<C> {
        &self.store
    }
}
