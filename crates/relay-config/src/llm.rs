use std::path::PathBuf;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Top-level LLM configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Upstream provider configurations keyed by name
    #[serde(default)]
    pub providers: IndexMap<String, LlmProviderConfig>,
    /// Model catalog keyed by model id
    #[serde(default)]
    pub models: IndexMap<String, ModelEntry>,
    /// Directory for per-user attachment upload caches
    ///
    /// Defaults to the system temp directory when absent.
    #[serde(default)]
    pub upload_cache_dir: Option<PathBuf>,
    /// Maximum provider round-trips per request when the model keeps
    /// requesting tools
    #[serde(default = "default_max_tool_round_trips")]
    pub max_tool_round_trips: u32,
}

const fn default_max_tool_round_trips() -> u32 {
    8
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            providers: IndexMap::new(),
            models: IndexMap::new(),
            upload_cache_dir: None,
            max_tool_round_trips: default_max_tool_round_trips(),
        }
    }
}

/// Configuration for a single upstream provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmProviderConfig {
    /// Provider wire-format family
    #[serde(rename = "type")]
    pub family: ProviderFamilyConfig,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Forward the client's bearer token to the provider
    #[serde(default)]
    pub forward_authorization: bool,
}

/// Supported provider wire-format families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamilyConfig {
    /// OpenAI-compatible chat completions API
    Openai,
    /// Google Generative Language API
    Google,
}

/// Catalog entry describing one servable model
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    /// Provider name (key in `providers`) serving this model
    pub provider: String,
    /// Attachment kinds this model accepts richly
    ///
    /// Kinds outside this list are degraded to textual placeholders.
    /// Recognized values: `image`, `video`, `document`, `text`, `binary`.
    #[serde(default)]
    pub supported_attachments: Vec<String>,
    /// Output token ceiling forwarded to the provider
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// Whether the model emits a separate reasoning channel
    #[serde(default)]
    pub is_reasoner: bool,
}
