use apebase_core::control::{ControlError, TokenControlPlane};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

use crate::config::ApebaseConfig;

/// Opens the embedded database and loads the configured datafile into it.
pub async fn build_control_plane(
    config: &ApebaseConfig,
) -> Result<TokenControlPlane<Db>, BootstrapError> {
    let db = Surreal::new::<Mem>(()).await?;
    db.use_ns(&config.db_namespace).use_db(&config.db_name).await?;

    let control = TokenControlPlane::new(db);
    control.import_datafile(&config.db_file).await?;
    Ok(control)
}

#[derive(Debug)]
pub enum BootstrapError {
    Database(Box<surrealdb::Error>),
    Import(ControlError),
}

impl std::fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database(err) => write!(f, "failed to open database: {err}"),
            Self::Import(err) => write!(f, "failed to load datafile: {err}"),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<surrealdb::Error> for BootstrapError {
    fn from(err: surrealdb::Error) -> Self {
        Self::Database(Box::new(err))
    }
}

impl From<ControlError> for BootstrapError {
    fn from(err: ControlError) -> Self {
        Self::Import(err)
    }
}
