use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;

/// Terminal status of a tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// The tool completed and produced a usable result
    Success,
    /// The tool failed; `result` describes the failure
    Error,
}

/// One intermediate progress report from a progressive tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolStep {
    /// 1-based step counter
    pub step: u32,
    /// Human-readable progress text
    pub message: String,
    /// Completion estimate, 0-100
    pub progress: u8,
    /// Optional tool-defined payload for this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// The terminal result of a tool invocation
#[derive(Debug, Clone, Serialize)]
pub struct ToolFinal {
    /// Success or error
    pub status: ToolStatus,
    /// Machine-readable result payload
    pub result: Value,
    /// Text suitable for showing to the user and feeding back to the model
    pub display_text: String,
}

impl ToolFinal {
    /// A success final with a JSON result and display text
    pub fn success(result: Value, display_text: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Success,
            result,
            display_text: display_text.into(),
        }
    }

    /// An error final carrying a machine-readable error type and message
    pub fn error(error_type: &str, message: &str) -> Self {
        Self {
            status: ToolStatus::Error,
            result: serde_json::json!({ "error_type": error_type, "message": message }),
            display_text: message.to_owned(),
        }
    }
}

impl From<&ToolError> for ToolFinal {
    fn from(err: &ToolError) -> Self {
        Self::error(err.type_name(), &err.to_string())
    }
}

/// One element of a tool invocation's output sequence
///
/// A conforming sequence is zero or more `Step`s followed by exactly
/// one `Final`. The invoker enforces this shape on misbehaving tools.
#[derive(Debug, Clone)]
pub enum ToolEvent {
    /// Intermediate progress
    Step(ToolStep),
    /// Terminal result
    Final(ToolFinal),
}

impl ToolEvent {
    /// Whether this event terminates the invocation
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }
}
