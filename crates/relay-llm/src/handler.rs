//! Axum route handlers for the chat surface

use std::convert::Infallible;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use bytes::Bytes;
use futures_util::StreamExt;
use relay_core::{HttpError, RequestContext};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::demux::{ChatRun, run_chat};
use crate::error::LlmError;
use crate::provider::ProviderRequest;
use crate::sse;
use crate::state::LlmState;
use crate::types::{ChatMessage, ToolSchema};

/// Build the chat router with all endpoints
pub fn chat_router(state: LlmState) -> Router {
    Router::new()
        .route("/v1/chat", routing::post(chat))
        .route("/v1/models", routing::get(list_models))
        .with_state(state)
}

/// One chat request as submitted by the client
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Catalog model id
    pub model: String,
    /// Conversation this request belongs to, as `{user}/{uuid}`
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Full conversation history
    pub messages: Vec<ChatMessage>,
}

/// Handle `POST /v1/chat`
///
/// Validation failures come back as plain JSON errors before any SSE
/// bytes are written; once streaming starts, failures surface as
/// `error` frames inside the stream.
async fn chat(
    State(state): State<LlmState>,
    axum::Extension(context): axum::Extension<RequestContext>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let user_id = context.user_id_or_anonymous().to_owned();

    if let Some(conversation_id) = &request.conversation_id
        && let Err(e) = verify_conversation_owner(conversation_id, &user_id)
    {
        tracing::warn!(user_id = %user_id, conversation_id = %conversation_id, "conversation ownership check failed");
        return error_response(&e);
    }

    let (model, provider) = match state.resolve(&request.model) {
        Ok(resolved) => resolved,
        Err(e) => return error_response(&e),
    };
    let model = model.clone();

    if request.messages.is_empty() {
        return error_response(&LlmError::InvalidRequest("messages must not be empty".to_owned()));
    }

    let cancel = CancellationToken::new();
    let messages = match state
        .normalizer()
        .normalize(&request.messages, &model, &user_id, &cancel)
        .await
    {
        Ok(messages) => messages,
        Err(e) => return error_response(&e),
    };

    let registry = state.registry();
    let max_output_tokens = model.max_output_tokens;
    let run = ChatRun {
        provider,
        model,
        request: ProviderRequest {
            messages,
            tools: ToolSchema::from_registry(&registry),
            max_output_tokens,
        },
        registry,
        context,
        cancel: cancel.clone(),
        max_round_trips: state.max_tool_round_trips(),
    };

    // The guard lives inside the body stream; a client disconnect drops
    // the stream and cancels any in-flight provider or tool work
    let guard = cancel.drop_guard();
    let body_stream = async_stream::stream! {
        let _guard = guard;
        let mut events = std::pin::pin!(run_chat(run));
        while let Some(event) = events.next().await {
            yield Ok::<Bytes, Infallible>(sse::encode_frame(&event));
        }
    };

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body_stream),
    )
        .into_response()
}

/// Handle `GET /v1/models`
async fn list_models(State(state): State<LlmState>) -> Response {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let data: Vec<serde_json::Value> = state
        .model_ids()
        .into_iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "object": "model",
                "created": now,
                "owned_by": "relay",
            })
        })
        .collect();

    Json(serde_json::json!({ "object": "list", "data": data })).into_response()
}

/// A request may only continue a conversation its user owns
///
/// Conversation ids are namespaced as `{user}/{uuid}`; a mismatched
/// prefix is a hard denial, not a degradation.
fn verify_conversation_owner(conversation_id: &str, user_id: &str) -> Result<(), LlmError> {
    match conversation_id.split_once('/') {
        Some((owner, _)) if owner == user_id => Ok(()),
        Some(_) => Err(LlmError::Forbidden),
        None => Err(LlmError::InvalidRequest(
            "conversation_id must be of the form {user}/{id}".to_owned(),
        )),
    }
}

/// Render an error as a plain JSON response
fn error_response(error: &LlmError) -> Response {
    let status = error.status_code();
    let body = serde_json::json!({
        "error": {
            "message": error.client_message(),
            "type": error.error_type(),
        }
    });

    (status, Json(body)).into_response()
}
