use std::path::Path;

use surrealdb::Connection;
use tracing::info;

use super::{ControlError, TokenControlPlane};
use crate::store::load_datafile;

/// Outcome of loading a datafile into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub loaded: usize,
    pub corrupt_lines: usize,
    pub total: u64,
}

impl<C: Connection> TokenControlPlane<C> {
    /// Loads an `NeDB` datafile into the store, appending in insertion order.
    ///
    /// # Errors
    /// Returns `ControlError::Import` if the datafile cannot be read or
    /// replayed, or the store rejects the documents.
    pub async fn import_datafile(&self, path: &Path) -> Result<ImportReport, ControlError> {
        self.store.ensure_schema().await.map_err(ControlError::Import)?;
        let datafile = load_datafile(path).await.map_err(ControlError::Import)?;
        let corrupt_lines = datafile.corrupt_lines;
        let loaded = self
            .store
            .insert_documents(datafile.documents)
            .await
            .map_err(ControlError::Import)?;
        let total = self.store.count().await.map_err(ControlError::Import)?;
        info!(
            path = %path.display(),
            loaded,
            corrupt_lines,
            total,
            "database loaded"
        );
        Ok(ImportReport {
            loaded,
            corrupt_lines,
            total,
        })
    }
}
