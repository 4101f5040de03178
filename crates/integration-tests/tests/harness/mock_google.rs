//! Mock Google Generative Language backend
//!
//! Serves scripted `streamGenerateContent` SSE bodies, records request
//! bodies, and accepts file uploads so attachment flows can run
//! end to end against it.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// Mock backend speaking the Google wire format
pub struct MockGoogle {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    rounds: Mutex<Vec<String>>,
    requests: Mutex<Vec<serde_json::Value>>,
    uploads: Mutex<Vec<serde_json::Value>>,
}

impl MockGoogle {
    /// Start the mock server with one SSE body per expected request
    pub async fn start(rounds: Vec<String>) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            rounds: Mutex::new(rounds),
            requests: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1beta/models/{model_action}", routing::post(handle_generate))
            .route("/upload/v1beta/files", routing::post(handle_upload))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    pub fn base_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    /// Number of generate requests received
    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    /// The nth generate request body
    pub fn request_body(&self, n: usize) -> serde_json::Value {
        self.state.requests.lock().unwrap()[n].clone()
    }

    /// Number of file uploads received
    pub fn upload_count(&self) -> usize {
        self.state.uploads.lock().unwrap().len()
    }
}

impl Drop for MockGoogle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_generate(
    State(state): State<Arc<MockState>>,
    Path(model_action): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    if !model_action.ends_with(":streamGenerateContent") {
        return StatusCode::NOT_FOUND.into_response();
    }
    state.requests.lock().unwrap().push(body);

    let mut rounds = state.rounds.lock().unwrap();
    if rounds.is_empty() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": {"message": "mock script exhausted"}})),
        )
            .into_response();
    }

    let body = rounds.remove(0);
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/event-stream")],
        body,
    )
        .into_response()
}

/// Accept any multipart upload and hand back an immediately active file
async fn handle_upload(State(state): State<Arc<MockState>>, body: axum::body::Bytes) -> impl IntoResponse {
    let file = serde_json::json!({
        "name": format!("files/upload-{}", state.uploads.lock().unwrap().len()),
        "uri": "https://files.example/generated",
        "mimeType": "application/octet-stream",
        "state": "ACTIVE"
    });
    state
        .uploads
        .lock()
        .unwrap()
        .push(serde_json::json!({"size": body.len()}));
    Json(serde_json::json!({"file": file}))
}

// -- SSE body builders --

/// Assemble chunks into an SSE body (no terminator sentinel)
pub fn sse_body(chunks: &[serde_json::Value]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body
}

/// A chunk carrying incremental answer text
pub fn text_chunk(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
    })
}

/// The terminal chunk for a turn
pub fn finish_chunk(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 3, "totalTokenCount": 10}
    })
}

/// A chunk carrying a whole function call
pub fn function_call_chunk(name: &str, args: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"parts": [{"functionCall": {"name": name, "args": args}}], "role": "model"}
        }]
    })
}
