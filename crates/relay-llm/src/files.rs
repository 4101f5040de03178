//! Remote file storage for large attachments
//!
//! Google's Files API accepts uploads that start in `PROCESSING` and
//! later settle into `ACTIVE` or `FAILED`; callers must poll before the
//! file URI is usable in a request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::LlmError;
use crate::protocol::google::{GoogleFile, GoogleFileList, GoogleFileUploadResponse};

/// Interval between processing-state polls
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Poll ceiling; large videos can take a while to settle
const MAX_POLL_ATTEMPTS: u32 = 150;

/// Processing state of a remote file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Upload accepted, not yet usable
    Processing,
    /// Ready for use in requests
    Active,
    /// Processing failed; the file is unusable
    Failed,
}

impl FileState {
    fn parse(raw: &str) -> Self {
        match raw {
            "ACTIVE" => Self::Active,
            "FAILED" => Self::Failed,
            _ => Self::Processing,
        }
    }
}

/// A file tracked by a remote store
#[derive(Debug, Clone)]
pub struct RemoteFile {
    /// Store resource name (`files/{id}`)
    pub name: String,
    /// URI usable in provider requests
    pub uri: String,
    /// MIME type
    pub mime_type: String,
    /// Current processing state
    pub state: FileState,
}

impl From<GoogleFile> for RemoteFile {
    fn from(file: GoogleFile) -> Self {
        Self {
            state: FileState::parse(&file.state),
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type,
        }
    }
}

/// Remote storage for attachments too large to inline
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Upload a file and return its initial tracking record
    async fn upload(&self, display_name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<RemoteFile, LlmError>;

    /// Fetch the current state of a tracked file
    async fn status(&self, name: &str) -> Result<RemoteFile, LlmError>;

    /// List all tracked files
    async fn list(&self) -> Result<Vec<RemoteFile>, LlmError>;
}

/// Poll a freshly uploaded file until it leaves `PROCESSING`
///
/// Bounded and cancellable; cancellation and poll exhaustion both
/// surface as streaming errors rather than hanging the request.
pub async fn wait_until_active(
    store: &dyn FileStore,
    file: RemoteFile,
    cancel: &CancellationToken,
) -> Result<RemoteFile, LlmError> {
    poll_until_active(store, file, POLL_INTERVAL, MAX_POLL_ATTEMPTS, cancel).await
}

async fn poll_until_active(
    store: &dyn FileStore,
    mut file: RemoteFile,
    interval: Duration,
    max_attempts: u32,
    cancel: &CancellationToken,
) -> Result<RemoteFile, LlmError> {
    for _ in 0..max_attempts {
        match file.state {
            FileState::Active => return Ok(file),
            FileState::Failed => {
                return Err(LlmError::Streaming(format!("file processing failed: {}", file.name)));
            }
            FileState::Processing => {}
        }

        tokio::select! {
            () = cancel.cancelled() => {
                return Err(LlmError::Streaming("request cancelled while waiting for file".to_owned()));
            }
            () = tokio::time::sleep(interval) => {}
        }

        file = store.status(&file.name).await?;
    }

    Err(LlmError::Streaming(format!(
        "file did not become active in time: {}",
        file.name
    )))
}

/// Google Files API backed store
pub struct GoogleFileStore {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl GoogleFileStore {
    /// Create a store against the given API base (`.../v1beta`)
    pub fn new(base_url: Url, api_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    /// API root with the version path stripped
    fn api_root(&self) -> String {
        self.base_url
            .as_str()
            .trim_end_matches('/')
            .trim_end_matches("/v1beta")
            .to_owned()
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/v1beta/files?key={}", self.api_root(), self.api_key.expose_secret())
    }

    fn resource_url(&self, name: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{name}?key={}", self.api_key.expose_secret())
    }

    fn list_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/files?key={}", self.api_key.expose_secret())
    }
}

#[async_trait]
impl FileStore for GoogleFileStore {
    async fn upload(&self, display_name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<RemoteFile, LlmError> {
        let metadata = serde_json::json!({ "file": { "display_name": display_name } });
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string()).mime_str("application/json")
                    .map_err(|e| LlmError::Internal(e.into()))?,
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .mime_str(mime_type)
                    .map_err(|e| LlmError::Internal(e.into()))?,
            );

        let response = self
            .client
            .post(self.upload_url())
            .header("X-Goog-Upload-Protocol", "multipart")
            .multipart(form)
            .send()
            .await
            .map_err(|e| LlmError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream(format!("file upload returned {status}: {body}")));
        }

        let uploaded: GoogleFileUploadResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("failed to parse upload response: {e}")))?;

        tracing::debug!(name = %uploaded.file.name, "uploaded attachment to file store");
        Ok(uploaded.file.into())
    }

    async fn status(&self, name: &str) -> Result<RemoteFile, LlmError> {
        let response = self
            .client
            .get(self.resource_url(name))
            .send()
            .await
            .map_err(|e| LlmError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::Upstream(format!("file status returned {}", response.status())));
        }

        let file: GoogleFile = response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("failed to parse file status: {e}")))?;

        Ok(file.into())
    }

    async fn list(&self) -> Result<Vec<RemoteFile>, LlmError> {
        let response = self
            .client
            .get(self.list_url())
            .send()
            .await
            .map_err(|e| LlmError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::Upstream(format!("file list returned {}", response.status())));
        }

        let listed: GoogleFileList = response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("failed to parse file list: {e}")))?;

        Ok(listed.files.into_iter().map(RemoteFile::from).collect())
    }
}
