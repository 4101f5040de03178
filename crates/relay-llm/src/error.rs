use http::StatusCode;
use relay_core::HttpError;
use thiserror::Error;

/// Errors that can occur during chat orchestration
#[derive(Debug, Error)]
pub enum LlmError {
    /// Requested model is not in the catalog
    #[error("model not found: {model}")]
    ModelNotFound {
        /// The unresolved model id
        model: String,
    },

    /// Catalog entry references a provider that is not configured
    #[error("provider not found: {provider}")]
    ProviderNotFound {
        /// The unresolved provider name
        provider: String,
    },

    /// Upstream provider returned an error
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Error during streaming response
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Client sent a malformed or invalid request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The conversation does not belong to the requesting user
    #[error("conversation access denied")]
    Forbidden,

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ModelNotFound { .. } | Self::ProviderNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Streaming(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::ModelNotFound { .. } | Self::ProviderNotFound { .. } => "not_found_error",
            Self::Upstream(_) => "upstream_error",
            Self::Streaming(_) => "streaming_error",
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Forbidden => "permission_error",
            Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }
}
