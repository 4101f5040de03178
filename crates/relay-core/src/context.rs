use secrecy::SecretString;

/// Runtime context for one chat request
///
/// Carried from the HTTP layer through provider calls and attachment
/// normalization. Never shared across requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP request parts (method, URI, headers, extensions)
    pub parts: http::request::Parts,
    /// User-provided API key that overrides the configured key
    pub api_key: Option<SecretString>,
    /// Stable identifier for the requesting user
    ///
    /// Scopes per-user resources such as the attachment upload cache.
    pub user_id: Option<String>,
}

impl RequestContext {
    /// Create a minimal context for embedded (non-HTTP) use
    pub fn empty() -> Self {
        let (parts, ()) = http::Request::builder()
            .method(http::Method::GET)
            .uri("/")
            .body(())
            .expect("valid minimal request")
            .into_parts();

        Self {
            parts,
            api_key: None,
            user_id: None,
        }
    }

    /// Access request headers
    pub fn headers(&self) -> &http::HeaderMap {
        &self.parts.headers
    }

    /// The user id, or `"anonymous"` when the request carried none
    pub fn user_id_or_anonymous(&self) -> &str {
        self.user_id.as_deref().unwrap_or("anonymous")
    }
}
