//! Google Generative Language API provider implementation

use std::pin::Pin;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use relay_config::LlmProviderConfig;
use relay_core::RequestContext;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{ChatProvider, ProviderRequest};
use crate::convert::google::{build_request, chunk_to_events};
use crate::error::LlmError;
use crate::protocol::google::GoogleStreamChunk;
use crate::types::ProviderEvent;

/// Default Google Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Generative Language API provider
pub struct GoogleProvider {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    forward_authorization: bool,
}

impl GoogleProvider {
    /// Create from provider configuration
    pub fn new(name: String, config: &LlmProviderConfig) -> Result<Self, LlmError> {
        let base_url = match config.base_url.clone() {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL).map_err(|e| LlmError::Internal(e.into()))?,
        };

        Ok(Self {
            name,
            client: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            forward_authorization: config.forward_authorization,
        })
    }

    /// Resolve the API key from config or request context
    fn resolve_api_key(&self, context: &RequestContext) -> Option<String> {
        if self.forward_authorization
            && let Some(key) = &context.api_key
        {
            return Some(key.expose_secret().to_owned());
        }
        self.api_key.as_ref().map(|k| k.expose_secret().to_owned())
    }

    /// Build the `streamGenerateContent` endpoint URL for a model
    fn stream_url(&self, model: &str, api_key: Option<&str>) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = format!("{base}/models/{model}:streamGenerateContent?alt=sse");
        if let Some(key) = api_key {
            use std::fmt::Write;
            let _ = write!(url, "&key={key}");
        }
        url
    }
}

#[async_trait]
impl ChatProvider for GoogleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream_chat(
        &self,
        model_id: &str,
        request: &ProviderRequest,
        context: &RequestContext,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<ProviderEvent, LlmError>> + Send>>, LlmError> {
        let wire_request = build_request(request);
        let api_key = self.resolve_api_key(context);
        let url = self.stream_url(model_id, api_key.as_deref());

        let response = self.client.post(&url).json(&wire_request).send().await.map_err(|e| {
            tracing::error!(provider = %self.name, error = %e, "upstream stream request failed");
            LlmError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(provider = %self.name, status = %status, "upstream returned error");
            return Err(LlmError::Upstream(format!("provider returned {status}: {body}")));
        }

        let event_stream = response.bytes_stream().eventsource();

        let mapped = event_stream
            .map(|result| match result {
                Ok(event) => match serde_json::from_str::<GoogleStreamChunk>(event.data.trim()) {
                    Ok(chunk) => chunk_to_events(&chunk).into_iter().map(Ok).collect(),
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping unparseable SSE chunk");
                        vec![Ok(ProviderEvent::Unknown)]
                    }
                },
                Err(e) => vec![Err(LlmError::Streaming(e.to_string()))],
            })
            .flat_map(futures_util::stream::iter);

        Ok(Box::pin(mapped))
    }
}
