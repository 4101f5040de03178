//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;

use relay_config::{Config, HealthConfig, LlmProviderConfig, ModelEntry, ProviderFamilyConfig, ServerConfig};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                },
                ..Config::default()
            },
        }
    }

    /// Add an OpenAI-compatible provider pointed at a mock backend
    pub fn with_openai_provider(mut self, name: &str, base_url: &str) -> Self {
        self.config.llm.providers.insert(
            name.to_owned(),
            LlmProviderConfig {
                family: ProviderFamilyConfig::Openai,
                api_key: Some(SecretString::from("test-key")),
                base_url: Some(base_url.parse().expect("valid URL")),
                forward_authorization: false,
            },
        );
        self
    }

    /// Add a Google-style provider pointed at a mock backend
    pub fn with_google_provider(mut self, name: &str, base_url: &str) -> Self {
        self.config.llm.providers.insert(
            name.to_owned(),
            LlmProviderConfig {
                family: ProviderFamilyConfig::Google,
                api_key: Some(SecretString::from("test-key")),
                base_url: Some(base_url.parse().expect("valid URL")),
                forward_authorization: false,
            },
        );
        self
    }

    /// Add a catalog model served by the named provider
    pub fn with_model(mut self, model_id: &str, provider: &str, supported_attachments: &[&str]) -> Self {
        self.config.llm.models.insert(
            model_id.to_owned(),
            ModelEntry {
                provider: provider.to_owned(),
                supported_attachments: supported_attachments.iter().map(|s| (*s).to_owned()).collect(),
                max_output_tokens: None,
                is_reasoner: false,
            },
        );
        self
    }

    /// Journal attachment uploads into the given directory
    pub fn with_upload_cache_dir(mut self, dir: &Path) -> Self {
        self.config.llm.upload_cache_dir = Some(dir.to_path_buf());
        self
    }

    /// Cap provider round-trips per request
    pub fn with_max_round_trips(mut self, max: u32) -> Self {
        self.config.llm.max_tool_round_trips = max;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
