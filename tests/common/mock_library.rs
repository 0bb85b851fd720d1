//! Mock library server for testing cover resolution.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::routing::any;
use axum::Router;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A captured request for assertions.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

/// A mock response to return.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub delay_ms: u64,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self::status(404)
    }
}

impl MockResponse {
    pub fn image(body: &[u8]) -> Self {
        Self {
            status: 200,
            headers: vec![("content-type".to_string(), "image/jpeg".to_string())],
            body: body.to_vec(),
            delay_ms: 0,
        }
    }

    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            headers: vec![("content-type".to_string(), "text/html; charset=utf-8".to_string())],
            body: body.as_bytes().to_vec(),
            delay_ms: 0,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: format!("status {}", status).into_bytes(),
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    /// One-shot responses, consumed before the fixed route.
    queued: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    /// Responses served for every request to a path.
    routes: Arc<Mutex<HashMap<String, MockResponse>>>,
}

/// Mock library server. Unknown paths answer 404.
pub struct MockLibrary {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockLibrary {
    /// Start a new mock library server.
    pub async fn start() -> Self {
        let state = MockState::default();

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/{*path}", any(handle_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    /// Serve `resp` for every request to `path`.
    pub async fn route(&self, path: &str, resp: MockResponse) {
        self.state.routes.lock().await.insert(path.to_string(), resp);
    }

    /// Serve `resp` for the next request to `path` only.
    pub async fn enqueue(&self, path: &str, resp: MockResponse) {
        self.state
            .queued
            .lock()
            .await
            .entry(path.to_string())
            .or_default()
            .push_back(resp);
    }

    /// Get all captured requests.
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().await.clone()
    }

    /// Paths of all captured requests, in arrival order.
    pub async fn captured_paths(&self) -> Vec<String> {
        self.captured_requests()
            .await
            .into_iter()
            .map(|r| r.path)
            .collect()
    }

    /// How many requests hit `path`.
    pub async fn hits(&self, path: &str) -> usize {
        self.captured_requests()
            .await
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    /// Get the base URL for this mock server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Forget captured requests, keep routes.
    pub async fn clear_requests(&self) {
        self.state.requests.lock().await.clear();
    }
}

impl Drop for MockLibrary {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn handle_request(State(state): State<MockState>, req: Request<Body>) -> Response<Body> {
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let authorization = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    state.requests.lock().await.push(CapturedRequest {
        method: req.method().to_string(),
        path: path.clone(),
        authorization,
    });

    let queued = state
        .queued
        .lock()
        .await
        .get_mut(&path)
        .and_then(|queue| queue.pop_front());
    let mock_resp = match queued {
        Some(resp) => resp,
        None => state
            .routes
            .lock()
            .await
            .get(&path)
            .cloned()
            .unwrap_or_default(),
    };

    if mock_resp.delay_ms > 0 {
        tokio::time::sleep(tokio::time::Duration::from_millis(mock_resp.delay_ms)).await;
    }

    let mut builder = Response::builder().status(StatusCode::from_u16(mock_resp.status).unwrap());

    for (name, value) in mock_resp.headers {
        builder = builder.header(name, value);
    }

    builder.body(Body::from(mock_resp.body)).unwrap()
}
