//! Shared chat state built once from configuration

use std::collections::HashMap;
use std::sync::Arc;

use relay_config::{LlmConfig, ProviderFamilyConfig};
use relay_tools::ToolRegistry;

use crate::attach::{AttachmentNormalizer, UploadCache};
use crate::catalog::{ModelCatalog, ResolvedModel};
use crate::error::LlmError;
use crate::files::{FileStore, GoogleFileStore};
use crate::provider::ChatProvider;

/// Shared state for chat route handlers
#[derive(Clone)]
pub struct LlmState {
    inner: Arc<LlmStateInner>,
}

struct LlmStateInner {
    providers: HashMap<String, Arc<dyn ChatProvider>>,
    catalog: ModelCatalog,
    registry: Arc<ToolRegistry>,
    normalizer: AttachmentNormalizer,
    max_tool_round_trips: u32,
}

impl LlmState {
    /// Build state from validated configuration, constructing all
    /// providers and the attachment pipeline
    pub fn from_config(config: &LlmConfig, registry: Arc<ToolRegistry>) -> Result<Self, LlmError> {
        let mut providers: HashMap<String, Arc<dyn ChatProvider>> = HashMap::new();
        let mut file_store: Option<Arc<dyn FileStore>> = None;

        for (name, provider_config) in &config.providers {
            let provider: Arc<dyn ChatProvider> = match provider_config.family {
                ProviderFamilyConfig::Openai => {
                    Arc::new(crate::provider::openai::OpenAiProvider::new(name.clone(), provider_config)?)
                }
                ProviderFamilyConfig::Google => {
                    // The first keyed Google provider also backs the file store
                    if file_store.is_none()
                        && let Some(api_key) = &provider_config.api_key
                    {
                        // Same default the provider itself falls back to
                        let base_url = match provider_config.base_url.clone() {
                            Some(url) => url,
                            None => url::Url::parse("https://generativelanguage.googleapis.com/v1beta")
                                .map_err(|e| LlmError::Internal(e.into()))?,
                        };
                        file_store = Some(Arc::new(GoogleFileStore::new(base_url, api_key.clone())));
                    }
                    Arc::new(crate::provider::google::GoogleProvider::new(name.clone(), provider_config)?)
                }
            };

            providers.insert(name.clone(), provider);
        }

        let catalog = ModelCatalog::from_config(config)?;
        let cache_dir = config
            .upload_cache_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("relay-uploads"));
        let normalizer = AttachmentNormalizer::new(file_store, Arc::new(UploadCache::new(cache_dir)));

        Ok(Self {
            inner: Arc::new(LlmStateInner {
                providers,
                catalog,
                registry,
                normalizer,
                max_tool_round_trips: config.max_tool_round_trips,
            }),
        })
    }

    /// Resolve a model id to its catalog entry and provider
    pub fn resolve(&self, model_id: &str) -> Result<(&ResolvedModel, Arc<dyn ChatProvider>), LlmError> {
        let model = self.inner.catalog.resolve(model_id)?;
        let provider = self
            .inner
            .providers
            .get(&model.provider_name)
            .ok_or_else(|| LlmError::ProviderNotFound {
                provider: model.provider_name.clone(),
            })?;
        Ok((model, Arc::clone(provider)))
    }

    /// All servable model ids
    pub fn model_ids(&self) -> Vec<&str> {
        self.inner.catalog.model_ids()
    }

    /// The tool registry for this deployment
    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.inner.registry)
    }

    /// The attachment normalizer
    pub fn normalizer(&self) -> &AttachmentNormalizer {
        &self.inner.normalizer
    }

    /// Provider round-trip ceiling per request
    pub fn max_tool_round_trips(&self) -> u32 {
        self.inner.max_tool_round_trips
    }
}
