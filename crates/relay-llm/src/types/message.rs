use serde::{Deserialize, Serialize};

/// Role of a message participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
    /// Tool result
    Tool,
}

/// Normalized message content after attachment normalization
#[derive(Debug, Clone)]
pub enum HistoryContent {
    /// Plain text
    Text(String),
    /// Structured parts (text plus media)
    Parts(Vec<ContentPart>),
}

impl HistoryContent {
    /// Extract text content, joining parts if necessary
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::Image { .. } | ContentPart::FileRef { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

/// Provider-agnostic content part produced by the attachment normalizer
#[derive(Debug, Clone)]
pub enum ContentPart {
    /// Text block
    Text {
        /// The text string
        text: String,
    },
    /// Inline image as a base64 data URI
    Image {
        /// `data:<mime>;base64,<payload>`
        url: String,
    },
    /// Remote file reference (Google Files API upload)
    FileRef {
        /// Provider file URI
        uri: String,
        /// MIME type of the uploaded file
        mime_type: String,
    },
}

/// A completed tool call recorded in the assistant's history
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    /// Tool call identifier
    pub id: String,
    /// Tool name
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

/// One message in the evolving provider conversation
///
/// The attachment normalizer produces these from client messages; the
/// demultiplexer appends assistant tool-call records and tool results
/// between provider round-trips.
#[derive(Debug, Clone)]
pub struct HistoryMessage {
    /// Role of the message author
    pub role: Role,
    /// Message content
    pub content: HistoryContent,
    /// Tool calls made by the assistant
    pub tool_calls: Vec<ToolCallRecord>,
    /// ID of the tool call this message responds to (role `tool` only)
    pub tool_call_id: Option<String>,
    /// Tool name for role `tool` messages
    pub tool_name: Option<String>,
}

impl HistoryMessage {
    /// A plain text message
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: HistoryContent::Text(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// An assistant message carrying only tool-call records
    pub fn assistant_tool_calls(calls: Vec<ToolCallRecord>) -> Self {
        Self {
            role: Role::Assistant,
            content: HistoryContent::Text(String::new()),
            tool_calls: calls,
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// A tool-result message responding to one call
    pub fn tool_result(call_id: impl Into<String>, tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: HistoryContent::Text(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
            tool_name: Some(tool_name.into()),
        }
    }
}
