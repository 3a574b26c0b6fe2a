//! Streaming behavior: bodies are relayed as they arrive, in both directions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use futures_util::{stream, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};

mod common;

const CHUNK: usize = 64 * 1024;
const LARGE: usize = 16 * 1024 * 1024;

fn channel_stream(rx: mpsc::Receiver<Bytes>) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
    stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok(chunk), rx))
    })
}

type HeldReceiver = Arc<Mutex<Option<mpsc::Receiver<Bytes>>>>;

#[tokio::test]
async fn test_download_relays_before_upstream_finishes() {
    let (tx, rx) = mpsc::channel::<Bytes>(4);
    let held: HeldReceiver = Arc::new(Mutex::new(Some(rx)));

    let upstream = Router::new()
        .route(
            "/files/big.bin",
            get(|State(held): State<HeldReceiver>| async move {
                let rx = held.lock().unwrap().take().expect("single download");
                Body::from_stream(channel_stream(rx))
            }),
        )
        .with_state(held);
    let (gateway, _) = common::start_pair(upstream).await;

    tx.send(Bytes::from(vec![7u8; CHUNK])).await.unwrap();

    let mut res = tokio::time::timeout(
        Duration::from_secs(10),
        common::client().get(gateway.url("/api/files/big.bin")).send(),
    )
    .await
    .expect("response head must arrive while upstream is still sending")
    .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Upstream has produced one chunk and is still open.
    let mut received = 0;
    while received < CHUNK {
        let chunk = tokio::time::timeout(Duration::from_secs(10), res.chunk())
            .await
            .expect("first bytes must be relayed before upstream completes")
            .unwrap()
            .expect("stream ended early");
        received += chunk.len();
    }
    assert_eq!(received, CHUNK);

    let producer = tokio::spawn(async move {
        for _ in 1..(LARGE / CHUNK) {
            tx.send(Bytes::from(vec![7u8; CHUNK])).await.unwrap();
        }
    });

    let rest = tokio::time::timeout(Duration::from_secs(30), async {
        let mut total = received;
        while let Some(chunk) = res.chunk().await.unwrap() {
            assert!(chunk.iter().all(|b| *b == 7));
            total += chunk.len();
        }
        total
    })
    .await
    .unwrap();

    producer.await.unwrap();
    assert_eq!(rest, LARGE);
}

#[derive(Clone)]
struct UploadState {
    first_chunk: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

#[tokio::test]
async fn test_upload_streams_before_client_finishes() {
    let (first_tx, first_rx) = oneshot::channel();
    let state = UploadState {
        first_chunk: Arc::new(Mutex::new(Some(first_tx))),
    };

    let upstream = Router::new()
        .route(
            "/upload",
            post(|State(state): State<UploadState>, body: Body| async move {
                let mut total = 0usize;
                let mut stream = body.into_data_stream();
                while let Some(chunk) = stream.next().await {
                    let chunk = match chunk {
                        Ok(chunk) => chunk,
                        Err(_) => return (StatusCode::BAD_REQUEST, String::new()),
                    };
                    total += chunk.len();
                    if let Some(tx) = state.first_chunk.lock().unwrap().take() {
                        let _ = tx.send(());
                    }
                }
                (StatusCode::CREATED, total.to_string())
            }),
        )
        .with_state(state);
    let (gateway, _) = common::start_pair(upstream).await;

    let (tx, rx) = mpsc::channel::<Bytes>(4);
    let request = common::client()
        .post(gateway.url("/api/upload"))
        .header("content-type", "application/octet-stream")
        .body(reqwest::Body::wrap_stream(channel_stream(rx)));
    let pending = tokio::spawn(request.send());

    tx.send(Bytes::from(vec![1u8; CHUNK])).await.unwrap();
    tokio::time::timeout(Duration::from_secs(10), first_rx)
        .await
        .expect("upstream must see the first chunk before the upload completes")
        .unwrap();

    for _ in 1..(LARGE / CHUNK) {
        tx.send(Bytes::from(vec![1u8; CHUNK])).await.unwrap();
    }
    drop(tx);

    let res = tokio::time::timeout(Duration::from_secs(30), pending)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.text().await.unwrap(), LARGE.to_string());
}

#[tokio::test]
async fn test_upstream_failure_mid_stream_terminates_client() {
    let upstream = Router::new().route(
        "/export",
        get(|| async {
            // Pause before failing so the head and first chunk are flushed.
            let chunks = stream::unfold(0u8, |step| async move {
                match step {
                    0 => Some((
                        Ok::<_, std::io::Error>(Bytes::from_static(b"partial export ")),
                        1,
                    )),
                    1 => {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Some((
                            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone")),
                            2,
                        ))
                    }
                    _ => None,
                }
            });
            Body::from_stream(chunks)
        }),
    );
    let (gateway, _) = common::start_pair(upstream).await;

    let res = common::client()
        .get(gateway.url("/api/export"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = tokio::time::timeout(Duration::from_secs(10), res.bytes())
        .await
        .expect("truncated relay must terminate, not hang");
    assert!(body.is_err());
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_client_disconnect_releases_upstream_stream() {
    let released = Arc::new(AtomicBool::new(false));

    let upstream = Router::new()
        .route(
            "/events",
            get(|State(released): State<Arc<AtomicBool>>| async move {
                let flag = DropFlag(released);
                let endless = stream::unfold(flag, |flag| async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Some((Ok::<_, std::io::Error>(Bytes::from(vec![b'x'; 16 * 1024])), flag))
                });
                Body::from_stream(endless)
            }),
        )
        .with_state(released.clone());
    let (gateway, _) = common::start_pair(upstream).await;

    let mut res = common::client()
        .get(gateway.url("/api/events"))
        .send()
        .await
        .unwrap();
    assert!(res.chunk().await.unwrap().is_some());
    drop(res);

    tokio::time::timeout(Duration::from_secs(10), async {
        while !released.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("upstream stream must be dropped after the client goes away");
}

#[tokio::test]
async fn test_response_timeout_does_not_cut_slow_upload() {
    let upstream = Router::new().route(
        "/upload",
        post(|body: Bytes| async move { (StatusCode::CREATED, body.len().to_string()) }),
    );
    let upstream_addr = common::start_upstream(upstream).await;
    let gateway = common::start_gateway_with(Some(format!("http://{upstream_addr}")), |config| {
        config.timeouts.response_secs = 1;
    })
    .await;

    let chunks = stream::unfold(0, |sent| async move {
        if sent == 5 {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        Some((Ok::<_, std::io::Error>(Bytes::from(vec![b'u'; 1024])), sent + 1))
    });
    let res = common::client()
        .post(gateway.url("/api/upload"))
        .body(reqwest::Body::wrap_stream(chunks))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.text().await.unwrap(), (5 * 1024).to_string());
}

#[tokio::test]
async fn test_shutdown_drain_is_bounded_by_grace_period() {
    let upstream = Router::new().route(
        "/events",
        get(|| async {
            let endless = stream::repeat_with(|| {
                Ok::<_, std::io::Error>(Bytes::from_static(b"tick\n"))
            })
            .then(|chunk| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                chunk
            });
            Body::from_stream(endless)
        }),
    );
    let upstream_addr = common::start_upstream(upstream).await;
    let mut gateway = common::start_gateway_with(Some(format!("http://{upstream_addr}")), |config| {
        config.timeouts.shutdown_grace_secs = 1;
    })
    .await;

    let mut res = common::client()
        .get(gateway.url("/api/events"))
        .send()
        .await
        .unwrap();
    assert!(res.chunk().await.unwrap().is_some());

    gateway.stop();
    tokio::time::timeout(Duration::from_secs(5), &mut gateway.server)
        .await
        .expect("server must stop once the grace period has passed")
        .unwrap();
    drop(res);
}
