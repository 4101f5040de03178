/// One decoded unit of a provider's streaming response
///
/// Raw provider chunks are translated into this closed sum type once,
/// at the provider boundary; everything downstream dispatches on the
/// tag and never inspects wire shapes.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// Incremental answer text
    Content(String),
    /// Incremental reasoning text (reasoner models only)
    Reasoning(String),
    /// Partial or complete tool-call data
    ToolCallFragment(ToolCallFragment),
    /// The provider signaled the end of a turn
    Completion {
        /// Whether pending tool calls should now execute
        tool_calls: bool,
    },
    /// Trailing token-accounting metadata
    Usage(UsageMetadata),
    /// Unrecognized chunk shape, ignored downstream
    Unknown,
}

/// Partial tool-call data within one chunk
///
/// Providers differ in how they address fragments: some carry a call id
/// on every chunk, some only a positional slot index, and some split
/// `{id, name}` and `{arguments}` across chunks.
#[derive(Debug, Clone, Default)]
pub struct ToolCallFragment {
    /// Provider slot number for this call within the current turn
    pub index: Option<u32>,
    /// Provider-supplied call id
    pub id: Option<String>,
    /// Tool name (may arrive in a later chunk than the id)
    pub name: Option<String>,
    /// Argument text fragment, concatenated across chunks
    pub arguments: String,
}

/// Token usage reported by the provider at stream end
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageMetadata {
    /// Prompt token count
    pub prompt_tokens: u32,
    /// Completion token count
    pub completion_tokens: u32,
    /// Total token count
    pub total_tokens: u32,
}
