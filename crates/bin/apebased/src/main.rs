//! Daemon entry point for the apebase token viewer.
//!
//! Loads configuration from flags and the environment, loads the token
//! datafile into an embedded database, and serves the viewer over HTTP.

mod bootstrap;
mod config;

use apebase_web::ViewerServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::bootstrap::build_control_plane;
use crate::config::ApebaseConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let config = ApebaseConfig::from_args()?;
    info!(
        db_file = %config.db_file.display(),
        namespace = %config.db_namespace,
        database = %config.db_name,
        "loading token database"
    );
    let control = build_control_plane(&config).await?;

    ViewerServer::new(control, config.server_config())
        .serve()
        .await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
