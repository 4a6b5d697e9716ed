//! Transfers against a local axum server.

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::StatusCode;
use axum::routing::get;
use futures_util::stream;
use llamahub_core::artifact::ArtifactName;
use llamahub_download::{
    DownloadEnginePort, DownloadError, DownloadHandle, DownloadStatus, HttpDownloadEngine,
};
use tempfile::TempDir;
use tokio::net::TcpListener;

const BODY_LEN: usize = 10_000;

fn body() -> Vec<u8> {
    (0..BODY_LEN).map(|i| (i % 251) as u8).collect()
}

fn slow_chunks() -> Body {
    let chunks = stream::unfold(0_u32, |n| async move {
        if n == 5 {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
        Some((Ok::<_, Infallible>(vec![b'x'; 100]), n + 1))
    });
    Body::from_stream(chunks)
}

fn broken_chunks() -> Body {
    let chunks = stream::unfold(0_u32, |n| async move {
        match n {
            0 => Some((Ok(vec![b'a'; 512]), 1)),
            1 => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Some((
                    Err(io::Error::new(io::ErrorKind::ConnectionReset, "upstream went away")),
                    2,
                ))
            }
            _ => None,
        }
    });
    Body::from_stream(chunks)
}

async fn serve() -> SocketAddr {
    let app = Router::new()
        .route("/model.llamafile", get(|| async { body() }))
        .route(
            "/stream.llamafile",
            get(|| async {
                let chunks = body()
                    .chunks(3_000)
                    .map(|c| Ok::<_, Infallible>(c.to_vec()))
                    .collect::<Vec<_>>();
                Body::from_stream(stream::iter(chunks))
            }),
        )
        .route("/missing.llamafile", get(|| async { StatusCode::NOT_FOUND }))
        .route("/broken.llamafile", get(|| async { broken_chunks() }))
        .route("/slow.llamafile", get(|| async { slow_chunks() }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn name(raw: &str) -> ArtifactName {
    ArtifactName::parse(raw).unwrap()
}

async fn wait_terminal(handle: &DownloadHandle) -> DownloadStatus {
    let mut rx = handle.subscribe();
    let progress = tokio::time::timeout(
        Duration::from_secs(10),
        rx.wait_for(|p| p.status.is_terminal()),
    )
    .await
    .expect("transfer should finish")
    .unwrap()
    .clone();
    progress.status
}

#[tokio::test]
async fn test_download_with_content_length() {
    let addr = serve().await;
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("model.llamafile");
    let engine = HttpDownloadEngine::new();

    let handle = engine.begin(
        format!("http://{addr}/model.llamafile"),
        name("model.llamafile"),
        &target,
    );

    assert_eq!(wait_terminal(&handle).await, DownloadStatus::Completed);
    let progress = handle.progress();
    assert_eq!(progress.content_length, BODY_LEN as u64);
    assert_eq!(progress.written, BODY_LEN as u64);
    assert_eq!(progress.percent(), 100);
    assert_eq!(std::fs::read(&target).unwrap(), body());
}

#[tokio::test]
async fn test_download_without_content_length() {
    let addr = serve().await;
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("stream.llamafile");
    let engine = HttpDownloadEngine::new();

    let handle = engine.begin(
        format!("http://{addr}/stream.llamafile"),
        name("stream.llamafile"),
        &target,
    );

    assert_eq!(wait_terminal(&handle).await, DownloadStatus::Completed);
    let progress = handle.progress();
    assert_eq!(progress.content_length, 0);
    assert_eq!(progress.written, BODY_LEN as u64);
    assert_eq!(progress.percent(), 0);
    assert_eq!(std::fs::read(&target).unwrap(), body());
}

#[tokio::test]
async fn test_small_chunk_size_writes_everything() {
    let addr = serve().await;
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("model.llamafile");
    let engine = HttpDownloadEngine::new().with_chunk_size(7);

    let handle = engine.begin(
        format!("http://{addr}/model.llamafile"),
        name("model.llamafile"),
        &target,
    );

    assert_eq!(wait_terminal(&handle).await, DownloadStatus::Completed);
    assert_eq!(std::fs::read(&target).unwrap(), body());
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let addr = serve().await;
    let dir = TempDir::new().unwrap();
    let engine = HttpDownloadEngine::new().with_chunk_size(64);

    let handle = Arc::new(DownloadHandle::new(
        format!("http://{addr}/model.llamafile"),
        name("model.llamafile"),
        dir.path().join("model.llamafile"),
    ));
    let mut rx = handle.subscribe();
    engine.start(Arc::clone(&handle));

    let mut last = 0_u8;
    loop {
        let progress = rx.borrow_and_update().clone();
        let pct = progress.percent();
        assert!(pct >= last, "progress went backwards: {last} -> {pct}");
        assert_eq!(pct == 100, progress.written == progress.content_length && progress.content_length > 0);
        if pct == 100 {
            assert_eq!(progress.status, DownloadStatus::Completed);
        }
        last = pct;
        if progress.status.is_terminal() {
            break;
        }
        rx.changed().await.unwrap();
    }
    assert_eq!(last, 100);
}

#[tokio::test]
async fn test_full_progress_is_only_seen_once_file_is_complete() {
    let addr = serve().await;
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("model.llamafile");
    let engine = HttpDownloadEngine::new().with_chunk_size(100);

    let handle = engine.begin(
        format!("http://{addr}/model.llamafile"),
        name("model.llamafile"),
        &target,
    );

    let polled = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let progress = handle.progress();
            if progress.percent() == 100 {
                return progress;
            }
            assert!(progress.status.is_in_flight(), "{:?}", progress.status);
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("progress should reach 100");

    assert_eq!(polled.status, DownloadStatus::Completed);
    assert_eq!(std::fs::read(&target).unwrap(), body());
}

#[tokio::test]
async fn test_http_error_status_fails() {
    let addr = serve().await;
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("missing.llamafile");
    let engine = HttpDownloadEngine::new();

    let handle = engine.begin(
        format!("http://{addr}/missing.llamafile"),
        name("missing.llamafile"),
        &target,
    );

    let status = wait_terminal(&handle).await;
    let DownloadStatus::Failed { error } = status else {
        panic!("expected failure, got {status:?}");
    };
    assert!(matches!(
        error,
        DownloadError::Network {
            status_code: Some(404),
            ..
        }
    ));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_mid_stream_error_fails_and_keeps_partial_file() {
    let addr = serve().await;
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("broken.llamafile");
    let engine = HttpDownloadEngine::new();

    let handle = engine.begin(
        format!("http://{addr}/broken.llamafile"),
        name("broken.llamafile"),
        &target,
    );

    let status = wait_terminal(&handle).await;
    assert!(matches!(status, DownloadStatus::Failed { .. }), "{status:?}");
    assert!(target.exists());
    assert!(handle.progress().written <= 512);
}

#[tokio::test]
async fn test_unreachable_host_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = TempDir::new().unwrap();
    let handle = HttpDownloadEngine::new().begin(
        format!("http://{addr}/model.llamafile"),
        name("model.llamafile"),
        dir.path().join("model.llamafile"),
    );

    let status = wait_terminal(&handle).await;
    assert!(matches!(
        status,
        DownloadStatus::Failed {
            error: DownloadError::Network { .. }
        }
    ));
}

#[tokio::test]
async fn test_unwritable_target_fails_with_io_error() {
    let addr = serve().await;
    let dir = TempDir::new().unwrap();
    let handle = HttpDownloadEngine::new().begin(
        format!("http://{addr}/model.llamafile"),
        name("model.llamafile"),
        dir.path().join("no-such-dir").join("model.llamafile"),
    );

    let status = wait_terminal(&handle).await;
    assert!(matches!(
        status,
        DownloadStatus::Failed {
            error: DownloadError::Io { .. }
        }
    ));
}

#[tokio::test]
async fn test_transfer_continues_after_callers_drop_handle() {
    let addr = serve().await;
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("slow.llamafile");

    let handle = HttpDownloadEngine::new().begin(
        format!("http://{addr}/slow.llamafile"),
        name("slow.llamafile"),
        &target,
    );
    let mut rx = handle.subscribe();
    drop(handle);

    let progress = tokio::time::timeout(
        Duration::from_secs(10),
        rx.wait_for(|p| p.status.is_terminal()),
    )
    .await
    .expect("transfer should keep running")
    .unwrap()
    .clone();

    assert_eq!(progress.status, DownloadStatus::Completed);
    assert_eq!(progress.written, 500);
    assert_eq!(std::fs::read(&target).unwrap().len(), 500);
}
