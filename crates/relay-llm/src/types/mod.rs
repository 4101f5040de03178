//! Internal canonical types for chat orchestration
//!
//! Provider-agnostic representations that both wire formats convert to
//! and from; provider quirks stay inside `protocol` and `convert`.

pub mod attachment;
pub mod chat;
pub mod message;
pub mod stream;
pub mod tool;

pub use attachment::{Attachment, AttachmentKind, kind_for_mime};
pub use chat::{ChatEvent, ToolMessage};
pub use message::{ContentPart, HistoryContent, HistoryMessage, Role, ToolCallRecord};
pub use stream::{ProviderEvent, ToolCallFragment, UsageMetadata};
pub use tool::ToolSchema;

use serde::Deserialize;

/// One message as submitted by the client
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author
    pub role: Role,
    /// Textual content
    #[serde(default)]
    pub content: String,
    /// Ordered attachment list
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}
