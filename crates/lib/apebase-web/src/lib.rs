//! HTTP viewer for the apebase token collection.
//!
//! Serves the paginated listing, the token detail view, content-addressed
//! images from the local IPFS directory, and static files from the public
//! root.

pub mod views;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use apebase_core::control::{ControlError, TokenControlPlane};
use axum::Router;
use axum::body::Body;
use axum::extract::{Path as UrlPath, Query, Request, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use surrealdb::Connection;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Configuration for the viewer HTTP server.
#[derive(Debug, Clone)]
pub struct ViewerServerConfig {
    pub addr: SocketAddr,
    pub public_dir: PathBuf,
    pub ipfs_dir: PathBuf,
}

impl ViewerServerConfig {
    #[must_use]
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            public_dir: PathBuf::from("public"),
            ipfs_dir: PathBuf::from("public/apebase/ipfs"),
        }
    }

    #[must_use]
    pub fn with_public_dir(mut self, public_dir: impl Into<PathBuf>) -> Self {
        self.public_dir = public_dir.into();
        self
    }

    #[must_use]
    pub fn with_ipfs_dir(mut self, ipfs_dir: impl Into<PathBuf>) -> Self {
        self.ipfs_dir = ipfs_dir.into();
        self
    }
}

impl Default for ViewerServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], 3010)))
    }
}

/// HTTP viewer server wrapper.
pub struct ViewerServer<C: Connection> {
    config: ViewerServerConfig,
    control: TokenControlPlane<C>,
}

impl<C: Connection> ViewerServer<C> {
    #[must_use]
    pub const fn new(control: TokenControlPlane<C>, config: ViewerServerConfig) -> Self {
        Self { config, control }
    }
}

impl<C> ViewerServer<C>
where
    C: Connection + Send + Sync + 'static,
{
    /// Runs the HTTP server until shutdown.
    ///
    /// # Errors
    /// Returns any listener or server error.
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.addr;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let app = build_router(self.control, &self.config);

        info!("apebase viewer listening on {addr}");
        axum::serve(listener, app).await?;
        Ok(())
    }
}

struct AppState<C: Connection> {
    control: TokenControlPlane<C>,
    ipfs_dir: Arc<PathBuf>,
}

impl<C: Connection> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            control: self.control.clone(),
            ipfs_dir: self.ipfs_dir.clone(),
        }
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal Server Error".to_string(),
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::Validation(err) => Self::bad_request(err.to_string()),
            ControlError::Query(_) | ControlError::Import(_) => {
                error!(error = %err, "request failed");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ListParams {
    filter: Option<String>,
    page: Option<String>,
}

/// Builds the viewer router.
pub fn build_router<C>(control: TokenControlPlane<C>, config: &ViewerServerConfig) -> Router
where
    C: Connection + Send + Sync + 'static,
{
    let state = AppState {
        control,
        ipfs_dir: Arc::new(config.ipfs_dir.clone()),
    };
    Router::new()
        .route("/", get(list_tokens::<C>))
        .route("/token/:id", get(show_token::<C>))
        .route("/ipfs/:cid", get(serve_ipfs::<C>))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn list_tokens<C>(
    State(state): State<AppState<C>>,
    Query(params): Query<ListParams>,
) -> Result<Html<String>, ApiError>
where
    C: Connection + Send + Sync + 'static,
{
    let listing = state
        .control
        .list_tokens(params.filter.as_deref(), params.page.as_deref())
        .await?;
    // later pages are fetched incrementally and only need the list fragment
    let body = if listing.page.is_first() {
        views::index(&listing)
    } else {
        views::partial(&listing)
    };
    Ok(Html(body))
}

async fn show_token<C>(
    State(state): State<AppState<C>>,
    UrlPath(id): UrlPath<String>,
) -> Result<Html<String>, ApiError>
where
    C: Connection + Send + Sync + 'static,
{
    let record = state.control.get_token(&id).await?;
    Ok(Html(views::token(record.as_ref())))
}

async fn serve_ipfs<C>(
    State(state): State<AppState<C>>,
    UrlPath(cid): UrlPath<String>,
    request: Request,
) -> Response
where
    C: Connection + Send + Sync + 'static,
{
    let Some(path) = resolve_cid(&state.ipfs_dir, &cid) else {
        warn!(cid = %cid, "rejected content identifier");
        return ApiError::not_found("File not found").into_response();
    };
    let is_file = tokio::fs::metadata(&path)
        .await
        .is_ok_and(|metadata| metadata.is_file());
    if !is_file {
        warn!(path = %path.display(), "File not found");
        return ApiError::not_found("File not found").into_response();
    }
    match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// Maps a CID onto a file directly under the content directory.
fn resolve_cid(root: &Path, cid: &str) -> Option<PathBuf> {
    if cid.is_empty() || cid.contains("..") || cid.contains(['/', '\\']) {
        return None;
    }
    Some(root.join(cid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cids_stay_inside_the_content_directory() {
        let root = Path::new("/srv/ipfs");
        assert_eq!(
            resolve_cid(root, "QmAbc"),
            Some(PathBuf::from("/srv/ipfs/QmAbc"))
        );
        for cid in ["", "..", "../etc/passwd", "a/b", "a\\b", "Qm..x"] {
            assert_eq!(resolve_cid(root, cid), None, "{cid}");
        }
    }

    #[test]
    fn validation_errors_are_client_errors() {
        let err = ControlError::Validation(apebase_core::query::ValidationError::NotAnObject);
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.message.starts_with("Invalid filter query"));
    }

    #[test]
    fn store_errors_are_server_errors() {
        let err = ControlError::Query(apebase_core::store::StoreError::InvalidInput(
            "boom".to_string(),
        ));
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Internal Server Error");
    }
}
