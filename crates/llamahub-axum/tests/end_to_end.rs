//! Full artifact lifecycle over HTTP: a local file server provides the
//! artifact, the real engine fetches it and the real supervisor runs it.
#![cfg(unix)]

mod common;

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::Body;
use axum::http::StatusCode;
use futures_util::stream;
use serde_json::{Value, json};

use common::{get, post, serve, test_app};

const API: &str = "/api/llamafile_manager";
const SCRIPT: &str = "#!/bin/sh\nexec sleep 30\n";

/// The script, one byte at a time, slow enough to observe the transfer.
fn slow_body() -> Body {
    let chunks = stream::unfold(0_usize, |i| async move {
        if i == SCRIPT.len() {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(40)).await;
        Some((Ok::<_, Infallible>(vec![SCRIPT.as_bytes()[i]]), i + 1))
    });
    Body::from_stream(chunks)
}

async fn artifact_source() -> String {
    let router = Router::new()
        .route("/model.llamafile", axum::routing::get(|| async { SCRIPT }))
        .route("/slow.llamafile", axum::routing::get(|| async { slow_body() }));
    format!("http://{}", serve(router).await)
}

async fn wait_for_download(app: &Router, name: &str) -> Value {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let (status, snapshot) = get(app, &format!("{API}/downloads/{name}")).await;
        assert_eq!(status, StatusCode::OK);
        if snapshot["status"]["state"] == "completed" {
            return snapshot;
        }
        assert_ne!(snapshot["status"]["state"], "failed", "{snapshot}");
        assert!(Instant::now() < deadline, "download did not finish: {snapshot}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn download_run_stop_round_trip() {
    let source = artifact_source().await;
    let (_dir, app) = test_app().await;
    let name = "model.llamafile";
    let request = json!({"url": format!("{source}/model.llamafile"), "name": name});

    let (_, present) = get(&app, &format!("{API}/has_llamafile/{name}")).await;
    assert_eq!(present, json!(false));

    let (status, body) = post(&app, &format!("{API}/download_llamafile"), request.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, request);

    // Progress never goes backwards and ends at 100.
    let mut last = 0;
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let (_, pct) = post(&app, &format!("{API}/download_progress"), request.clone()).await;
        let pct = pct.as_u64().unwrap();
        assert!(pct >= last, "progress went backwards: {last} -> {pct}");
        last = pct;
        if pct == 100 {
            break;
        }
        assert!(Instant::now() < deadline, "progress stuck at {pct}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // A client that saw 100 may run the artifact right away.
    let (status, snapshot) = get(&app, &format!("{API}/downloads/{name}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["status"]["state"], "completed", "{snapshot}");
    assert_eq!(snapshot["written"], SCRIPT.len());
    assert_eq!(snapshot["content_length"], SCRIPT.len());

    let (_, present) = get(&app, &format!("{API}/has_llamafile/{name}")).await;
    assert_eq!(present, json!(true));
    let (_, again) = post(&app, &format!("{API}/download_llamafile"), request.clone()).await;
    assert_eq!(again, json!("already downloaded"));

    let run = json!({"name": name, "args": ["--port", "8800"]});
    let (status, body) = post(&app, &format!("{API}/run_llamafile"), run.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let (_, running) = post(&app, &format!("{API}/is_llamafile_running"), json!({"name": name})).await;
    assert_eq!(running, json!(true));

    let (_, body) = post(&app, &format!("{API}/run_llamafile"), run).await;
    assert_eq!(body, json!("already running"));
    let (_, runs) = get(&app, &format!("{API}/runs")).await;
    assert_eq!(runs.as_array().unwrap().len(), 1);
    assert_eq!(runs[0]["args"], json!(["--port", "8800"]));

    let started = Instant::now();
    let (status, body) = post(&app, &format!("{API}/stop_llamafile"), json!({"name": name})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
    assert!(started.elapsed() < Duration::from_secs(5));

    let (_, running) = post(&app, &format!("{API}/is_llamafile_running"), json!({"name": name})).await;
    assert_eq!(running, json!(false));
}

#[tokio::test]
async fn duplicate_download_and_busy_run() {
    let source = artifact_source().await;
    let (_dir, app) = test_app().await;
    let name = "slow.llamafile";
    let request = json!({"url": format!("{source}/slow.llamafile"), "name": name});

    let (_, first) = post(&app, &format!("{API}/download_llamafile"), request.clone()).await;
    let (_, second) = post(&app, &format!("{API}/download_llamafile"), request.clone()).await;
    assert_eq!(first, request);
    assert_eq!(second, json!("already downloading"));

    let (status, body) = post(
        &app,
        &format!("{API}/run_llamafile"),
        json!({"name": name, "args": []}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["type"], "ARTIFACT_BUSY");

    let snapshot = wait_for_download(&app, name).await;
    // Chunked response: no declared length, so no percentage either.
    assert_eq!(snapshot["content_length"], 0);
    assert_eq!(snapshot["percent"], 0);
    assert_eq!(snapshot["written"], SCRIPT.len());

    let (_, downloads) = get(&app, &format!("{API}/downloads")).await;
    assert_eq!(downloads.as_array().unwrap().len(), 1);

    let (_, body) = post(
        &app,
        &format!("{API}/run_llamafile"),
        json!({"name": name, "args": []}),
    )
    .await;
    assert_eq!(body, json!("ok"));
    let (_, body) = post(&app, &format!("{API}/stop_llamafile"), json!({"name": name})).await;
    assert_eq!(body, json!("ok"));
}
