//! Provider trait and implementations for upstream LLM backends

pub mod google;
pub mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use relay_config::ProviderFamilyConfig;
use relay_core::RequestContext;

use crate::error::LlmError;
use crate::types::{HistoryMessage, ProviderEvent, ToolSchema};

/// Provider wire-format family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    /// OpenAI-compatible chat completions API
    Openai,
    /// Google Generative Language API
    Google,
}

impl From<ProviderFamilyConfig> for ProviderFamily {
    fn from(config: ProviderFamilyConfig) -> Self {
        match config {
            ProviderFamilyConfig::Openai => Self::Openai,
            ProviderFamilyConfig::Google => Self::Google,
        }
    }
}

/// One provider round-trip in canonical form
///
/// The demultiplexer re-sends a grown copy of this after each tool
/// round, so it owns its history rather than borrowing the request.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Normalized conversation history
    pub messages: Vec<HistoryMessage>,
    /// Tools advertised to the model
    pub tools: Vec<ToolSchema>,
    /// Output token ceiling
    pub max_output_tokens: Option<u32>,
}

/// Trait implemented by each upstream backend
///
/// Implementations decode their wire format into `ProviderEvent` before
/// yielding, so downstream code never sees raw chunks.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Open a streaming chat turn against the given model
    async fn stream_chat(
        &self,
        model_id: &str,
        request: &ProviderRequest,
        context: &RequestContext,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<ProviderEvent, LlmError>> + Send>>, LlmError>;
}
