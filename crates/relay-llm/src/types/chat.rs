use serde::Serialize;
use serde_json::Value;

use relay_tools::{ToolFinal, ToolStep};

/// A tool-result message for client-side history reconciliation
///
/// Serialized inside the consolidated `tool_messages` event.
#[derive(Debug, Clone, Serialize)]
pub struct ToolMessage {
    /// Always `"tool"`
    pub role: &'static str,
    /// Tool call this message responds to
    pub tool_call_id: String,
    /// Tool name
    pub name: String,
    /// JSON-encoded tool result
    pub content: String,
}

/// One client-visible event in a chat stream
///
/// Every variant maps to exactly one SSE frame; ordering is the order
/// the state machine produced them, with no reordering buffer.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// Incremental assistant text
    Content(String),
    /// Incremental reasoning text (reasoner models only)
    Reasoning(String),
    /// A tool's intermediate progress
    ToolStep {
        /// Originating call id
        tool_call_id: String,
        /// Tool name
        tool_name: String,
        /// Progress payload
        step: ToolStep,
    },
    /// A tool's terminal result
    ToolFinal {
        /// Originating call id
        tool_call_id: String,
        /// Tool name
        tool_name: String,
        /// Result payload
        result: ToolFinal,
    },
    /// Consolidated tool-result history, emitted once per request if any
    /// tools ran
    ToolMessages(Vec<ToolMessage>),
    /// Terminal failure; no further events follow
    Error(String),
}

impl ChatEvent {
    /// Build the wire JSON object for this event
    pub fn to_wire_json(&self) -> Value {
        match self {
            Self::Content(text) => serde_json::json!({ "content": text }),
            Self::Reasoning(text) => serde_json::json!({ "reasoning_content": text }),
            Self::ToolStep {
                tool_call_id,
                tool_name,
                step,
            } => {
                let mut body = serde_json::to_value(step).unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
                inject_call_identity(&mut body, tool_call_id, tool_name);
                serde_json::json!({ "step_response": body })
            }
            Self::ToolFinal {
                tool_call_id,
                tool_name,
                result,
            } => {
                let mut body = serde_json::to_value(result).unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
                inject_call_identity(&mut body, tool_call_id, tool_name);
                serde_json::json!({ "final_response": body })
            }
            Self::ToolMessages(messages) => serde_json::json!({ "tool_messages": messages }),
            Self::Error(message) => serde_json::json!({ "error": message }),
        }
    }
}

/// Add `tool_call_id` / `tool_name` to a tool event body
fn inject_call_identity(body: &mut Value, tool_call_id: &str, tool_name: &str) {
    if let Value::Object(map) = body {
        map.insert("tool_call_id".to_owned(), Value::String(tool_call_id.to_owned()));
        map.insert("tool_name".to_owned(), Value::String(tool_name.to_owned()));
    }
}
