//! Model catalog resolution

use indexmap::IndexMap;
use relay_config::LlmConfig;

use crate::error::LlmError;
use crate::provider::ProviderFamily;
use crate::types::AttachmentKind;

/// A catalog entry resolved against its provider
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    /// Model id as requested by the client
    pub model_id: String,
    /// Name of the provider serving this model
    pub provider_name: String,
    /// Provider wire-format family
    pub family: ProviderFamily,
    /// Attachment kinds the model accepts richly
    pub supported_attachments: Vec<AttachmentKind>,
    /// Output token ceiling forwarded to the provider
    pub max_output_tokens: Option<u32>,
    /// Whether the model emits a separate reasoning channel
    pub is_reasoner: bool,
}

impl ResolvedModel {
    /// Whether the model richly accepts this attachment kind
    pub fn supports(&self, kind: AttachmentKind) -> bool {
        self.supported_attachments.contains(&kind)
    }
}

/// Immutable model catalog built once from configuration
#[derive(Debug, Default)]
pub struct ModelCatalog {
    models: IndexMap<String, ResolvedModel>,
}

impl ModelCatalog {
    /// Build the catalog from validated configuration
    ///
    /// Config validation guarantees every entry's provider exists and
    /// every attachment kind name is recognized, so unknown names here
    /// are dropped rather than treated as errors.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut models = IndexMap::new();

        for (model_id, entry) in &config.models {
            let provider = config
                .providers
                .get(&entry.provider)
                .ok_or_else(|| LlmError::ProviderNotFound {
                    provider: entry.provider.clone(),
                })?;

            models.insert(
                model_id.clone(),
                ResolvedModel {
                    model_id: model_id.clone(),
                    provider_name: entry.provider.clone(),
                    family: ProviderFamily::from(provider.family),
                    supported_attachments: entry
                        .supported_attachments
                        .iter()
                        .filter_map(|name| AttachmentKind::parse(name))
                        .collect(),
                    max_output_tokens: entry.max_output_tokens,
                    is_reasoner: entry.is_reasoner,
                },
            );
        }

        Ok(Self { models })
    }

    /// Resolve a model id
    pub fn resolve(&self, model_id: &str) -> Result<&ResolvedModel, LlmError> {
        self.models.get(model_id).ok_or_else(|| LlmError::ModelNotFound {
            model: model_id.to_owned(),
        })
    }

    /// All model ids in configuration order
    pub fn model_ids(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        toml::from_str(
            r#"
            [providers.xai]
            type = "openai"
            api_key = "sk-test"

            [providers.gemini]
            type = "google"
            api_key = "g-test"

            [models.grok-2-latest]
            provider = "xai"
            supported_attachments = ["image"]

            [models.gemini-2-flash]
            provider = "gemini"
            supported_attachments = ["image", "video", "document"]
            max_output_tokens = 8192
            "#,
        )
        .unwrap()
    }

    #[test]
    fn resolves_family_and_capabilities() {
        let catalog = ModelCatalog::from_config(&config()).unwrap();

        let grok = catalog.resolve("grok-2-latest").unwrap();
        assert_eq!(grok.family, ProviderFamily::Openai);
        assert!(grok.supports(AttachmentKind::Image));
        assert!(!grok.supports(AttachmentKind::Video));

        let gemini = catalog.resolve("gemini-2-flash").unwrap();
        assert_eq!(gemini.family, ProviderFamily::Google);
        assert_eq!(gemini.max_output_tokens, Some(8192));
    }

    #[test]
    fn unknown_model_is_not_found() {
        let catalog = ModelCatalog::from_config(&config()).unwrap();
        assert!(matches!(
            catalog.resolve("gpt-oss"),
            Err(LlmError::ModelNotFound { model }) if model == "gpt-oss"
        ));
    }

    #[test]
    fn model_ids_preserve_config_order() {
        let catalog = ModelCatalog::from_config(&config()).unwrap();
        assert_eq!(catalog.model_ids(), vec!["grok-2-latest", "gemini-2-flash"]);
    }
}
