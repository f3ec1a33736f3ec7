use std::fs;
use std::path::Path;

use apebase_core::control::TokenControlPlane;
use apebase_web::{ViewerServerConfig, build_router};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tempfile::TempDir;
use tower::ServiceExt;

async fn seeded_control(count: usize) -> TokenControlPlane<Db> {
    let db = Surreal::new::<Mem>(()).await.expect("surrealdb");
    db.use_ns("apebase").use_db("web").await.expect("namespace");
    let control = TokenControlPlane::new(db);
    let documents = (0..count)
        .map(|index| {
            json!({
                "id": index.to_string(),
                "metadata": {
                    "name": format!("Ape #{index}"),
                    "image": format!("Qm{index}"),
                    "fur": if index % 2 == 0 { "Gold" } else { "Brown" }
                }
            })
        })
        .collect();
    control
        .store()
        .insert_documents(documents)
        .await
        .expect("insert documents");
    control
}

fn content_dirs() -> (TempDir, ViewerServerConfig) {
    let dir = tempfile::tempdir().expect("tempdir");
    let public = dir.path().join("public");
    let ipfs = dir.path().join("ipfs");
    fs::create_dir_all(&public).expect("public dir");
    fs::create_dir_all(&ipfs).expect("ipfs dir");
    fs::write(public.join("hello.txt"), "hello from public").expect("static file");
    fs::write(ipfs.join("QmImage"), [0x89, b'P', b'N', b'G']).expect("content file");
    fs::write(dir.path().join("secret"), "do not serve").expect("secret file");

    let config = ViewerServerConfig::default()
        .with_public_dir(public)
        .with_ipfs_dir(ipfs);
    (dir, config)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

async fn app_with(count: usize) -> (TempDir, Router) {
    let (dir, config) = content_dirs();
    let app = build_router(seeded_control(count).await, &config);
    (dir, app)
}

#[tokio::test]
async fn first_page_renders_full_document() {
    let (_dir, app) = app_with(25).await;
    let (status, body) = get(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("<!doctype html>"));
    assert!(body.contains("<textarea name=\"filter\" id=\"filter\" spellcheck=\"false\">{}</textarea>"));
    assert!(body.contains("Ape #24"));
    assert!(body.contains("src=\"/ipfs/Qm24\""));
    assert!(!body.contains("Ape #4<"));
    assert!(body.contains("data-next-page=\"1\""));
}

#[tokio::test]
async fn later_pages_render_fragment_only() {
    let (_dir, app) = app_with(25).await;
    let (status, body) = get(&app, "/?page=1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("<html"));
    assert!(body.contains("Ape #4<"));
    assert!(body.contains("Ape #0<"));
    assert!(!body.contains("data-next-page"));

    let (status, body) = get(&app, "/?page=99").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn filter_is_applied_and_echoed() {
    let (_dir, app) = app_with(6).await;
    let filter = urlencoding::encode(r#"{"metadata.fur":"Brown"}"#);
    let (status, body) = get(&app, &format!("/?filter={filter}")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("&quot;metadata.fur&quot;: &quot;Brown&quot;"));
    assert!(body.contains("Ape #5"));
    assert!(!body.contains("Ape #4"));
}

#[tokio::test]
async fn malformed_input_is_a_client_error() {
    let (_dir, app) = app_with(3).await;

    let filter = urlencoding::encode("{not json");
    let (status, body) = get(&app, &format!("/?filter={filter}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Invalid filter query"));

    let (status, _) = get(&app, "/?page=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_detail_and_absent_token() {
    let (_dir, app) = app_with(3).await;

    let (status, body) = get(&app, "/token/2").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Ape #2</h1>"));
    assert!(body.contains("src=\"/ipfs/Qm2\""));

    let (status, body) = get(&app, "/token/missing").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Token not found."));
}

#[tokio::test]
async fn content_files_are_served_or_not_found() {
    let (_dir, app) = app_with(1).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/ipfs/QmImage").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(&bytes[..], &[0x89, b'P', b'N', b'G']);

    let (status, body) = get(&app, "/ipfs/QmMissing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "File not found");

    let (status, _) = get(&app, "/ipfs/..%2Fsecret").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_files_and_health() {
    let (_dir, app) = app_with(1).await;

    let (status, body) = get(&app, "/hello.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "hello from public");

    let (status, _) = get(&app, "/nope.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn store_faults_are_server_errors() {
    // no namespace selected, so every query fails in the store
    let db = Surreal::new::<Mem>(()).await.expect("surrealdb");
    let (_dir, config) = content_dirs();
    let app = build_router(TokenControlPlane::new(db), &config);

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");

    let (status, _) = get(&app, "/token/1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let filter = urlencoding::encode("[]");
    let (status, _) = get(&app, &format!("/?filter={filter}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test]
fn default_config_matches_the_original_layout() {
    let config = ViewerServerConfig::default();
    assert_eq!(config.addr.port(), 3010);
    assert_eq!(config.public_dir, Path::new("public"));
    assert_eq!(config.ipfs_dir, Path::new("public/apebase/ipfs"));
}
