//! Common test fixtures: an in-process model file server and recording loaders

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, StatusCode, header::PROXY_AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use sd_model_cache::{LoadOptions, LoaderError, ModelLoader};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Size of the model file served at `/model.bin`
pub const MODEL_SIZE: usize = 2048;

#[derive(Clone, Default)]
struct ServerState {
    hits: Arc<AtomicUsize>,
    proxy_auth: Arc<Mutex<Vec<Option<String>>>>,
}

/// Model file server running on a random localhost port
///
/// Routes:
/// - `/model.bin`: 2048 zero bytes with `content-length`
/// - `/chunked.bin`: 3000 bytes streamed without `content-length`
/// - `/missing.bin`: 404
///
/// Requests in proxy form (`GET http://other-host/model.bin`) are routed by
/// path too, so the same server can stand in for a forward proxy.
pub struct ModelServer {
    pub addr: std::net::SocketAddr,
    state: ServerState,
}

impl ModelServer {
    pub async fn start() -> Self {
        let state = ServerState::default();
        let app = Router::new()
            .route("/model.bin", get(serve_model))
            .route("/chunked.bin", get(serve_chunked))
            .route("/missing.bin", get(serve_missing))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Number of requests served so far
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// `Proxy-Authorization` header of each request, in arrival order
    pub fn proxy_auth_headers(&self) -> Vec<Option<String>> {
        self.state.proxy_auth.lock().unwrap().clone()
    }
}

fn record(state: &ServerState, headers: &HeaderMap) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get(PROXY_AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.proxy_auth.lock().unwrap().push(auth);
}

async fn serve_model(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    record(&state, &headers);
    vec![0u8; MODEL_SIZE].into_response()
}

async fn serve_chunked(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    record(&state, &headers);
    let chunks = vec![
        Ok::<_, std::io::Error>(Bytes::from(vec![1u8; 1000])),
        Ok(Bytes::from(vec![2u8; 1000])),
        Ok(Bytes::from(vec![3u8; 1000])),
    ];
    Body::from_stream(futures::stream::iter(chunks)).into_response()
}

async fn serve_missing(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    record(&state, &headers);
    (StatusCode::NOT_FOUND, "not found").into_response()
}

/// Server that promises `declared` bytes, sends `sent`, then hangs up
pub async fn start_truncating_server(declared: usize, sent: usize) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\ncontent-type: application/octet-stream\r\n\r\n",
                declared
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&vec![7u8; sent]).await;
            let _ = socket.flush().await;
            drop(socket);
        }
    });

    addr
}

/// Loader that records each call and succeeds
#[derive(Default)]
pub struct RecordingLoader {
    calls: Mutex<Vec<(String, LoadOptions)>>,
}

impl RecordingLoader {
    pub fn calls(&self) -> Vec<(String, LoadOptions)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.calls().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl ModelLoader for RecordingLoader {
    type Model = ();

    async fn load(&self, identifier: &str, options: &LoadOptions) -> Result<(), LoaderError> {
        self.calls
            .lock()
            .unwrap()
            .push((identifier.to_string(), options.clone()));
        Ok(())
    }
}

#[derive(Debug)]
pub struct LoaderFailure(pub String);

impl std::fmt::Display for LoaderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "loader failed for {}", self.0)
    }
}

impl std::error::Error for LoaderFailure {}

/// Loader that always fails, counting attempts
#[derive(Default)]
pub struct FailingLoader {
    attempts: AtomicUsize,
}

impl FailingLoader {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoader for FailingLoader {
    type Model = ();

    async fn load(&self, identifier: &str, _options: &LoadOptions) -> Result<(), LoaderError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Box::new(LoaderFailure(identifier.to_string())))
    }
}
