//! Mock OpenAI-compatible backend
//!
//! Serves pre-scripted SSE bodies, one per request, and records every
//! request body for later assertions.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// Mock backend that replays scripted streaming responses
pub struct MockOpenAi {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    /// Remaining SSE bodies, consumed front to back
    rounds: Mutex<Vec<String>>,
    /// Request bodies in arrival order
    requests: Mutex<Vec<serde_json::Value>>,
}

impl MockOpenAi {
    /// Start the mock server with one SSE body per expected request
    pub async fn start(rounds: Vec<String>) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            rounds: Mutex::new(rounds),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat))
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
        format!("http://{}/v1", self.addr)
    }

    /// Number of chat requests received
    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    /// The nth request body
    pub fn request_body(&self, n: usize) -> serde_json::Value {
        self.state.requests.lock().unwrap()[n].clone()
    }
}

impl Drop for MockOpenAi {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_chat(State(state): State<Arc<MockState>>, Json(body): Json<serde_json::Value>) -> impl IntoResponse {
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

// -- SSE body builders --

/// Assemble chunks into an SSE body ending with `[DONE]`
pub fn sse_body(chunks: &[serde_json::Value]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// A chunk carrying incremental answer text
pub fn content_chunk(text: &str) -> serde_json::Value {
    serde_json::json!({"choices": [{"delta": {"content": text}}]})
}

/// A chunk carrying incremental reasoning text
pub fn reasoning_chunk(text: &str) -> serde_json::Value {
    serde_json::json!({"choices": [{"delta": {"reasoning_content": text}}]})
}

/// The terminal chunk for a turn
pub fn finish_chunk(reason: &str) -> serde_json::Value {
    serde_json::json!({"choices": [{"delta": {}, "finish_reason": reason}]})
}

/// A trailing usage chunk
pub fn usage_chunk() -> serde_json::Value {
    serde_json::json!({
        "choices": [],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

/// A tool call split across chunks the way real backends send it:
/// `{id, name}` first, argument fragments after
pub fn tool_call_chunks(id: &str, name: &str, arguments: &str) -> Vec<serde_json::Value> {
    let (head, tail) = arguments.split_at(arguments.len() / 2);
    vec![
        serde_json::json!({"choices": [{"delta": {"tool_calls": [
            {"index": 0, "id": id, "type": "function", "function": {"name": name, "arguments": ""}}
        ]}}]}),
        serde_json::json!({"choices": [{"delta": {"tool_calls": [
            {"index": 0, "function": {"arguments": head}}
        ]}}]}),
        serde_json::json!({"choices": [{"delta": {"tool_calls": [
            {"index": 0, "function": {"arguments": tail}}
        ]}}]}),
        finish_chunk("tool_calls"),
    ]
}
