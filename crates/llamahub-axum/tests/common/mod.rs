//! Shared helpers for router tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

use llamahub_axum::bootstrap::{CorsConfig, ServerConfig, bootstrap};
use llamahub_axum::routes::create_router;

/// Config rooted in `dir`, with progress observation off.
pub fn test_config(dir: &Path) -> ServerConfig {
    ServerConfig {
        observe_downloads: false,
        stop_grace: std::time::Duration::from_secs(2),
        ..ServerConfig::with_defaults().with_artifacts_dir(dir.to_string_lossy())
    }
}

/// Router over a fresh temporary artifacts directory.
pub async fn test_app() -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let ctx = bootstrap(&test_config(dir.path())).await.unwrap();
    (dir, create_router(ctx, &CorsConfig::AllowAll))
}

/// Send one request and decode the JSON reply (`Value::Null` for an empty body).
pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    call(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(app, Method::POST, uri, Some(body)).await
}

/// Serve `router` on an ephemeral loopback port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Write an executable shell artifact.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}
