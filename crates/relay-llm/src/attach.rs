//! Attachment normalization
//!
//! Rewrites client messages into provider-ready history. Every
//! attachment either becomes a rich content part the target model
//! accepts or degrades to a textual placeholder; normalization never
//! fails a request over an unusable attachment.

use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::catalog::ResolvedModel;
use crate::error::LlmError;
use crate::files::{FileStore, wait_until_active};
use crate::provider::ProviderFamily;
use crate::types::{Attachment, AttachmentKind, ChatMessage, ContentPart, HistoryContent, HistoryMessage};

/// Inline payload ceiling for the Google family
const GOOGLE_INLINE_LIMIT: u64 = 20 * 1024 * 1024;

/// Hard ceiling for video uploads
const GOOGLE_VIDEO_LIMIT: u64 = 2 * 1024 * 1024 * 1024;

/// Video container extensions the Google family accepts
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mpeg", "mov", "avi", "flv", "mpg", "webm", "wmv", "3gp"];

/// Textual stand-in for an attachment that could not be passed richly
fn placeholder(kind: AttachmentKind, name: &str) -> String {
    format!("[附件[{}]: {}]", kind.as_str(), name)
}

/// One remembered upload, keyed by user, filename, and size
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CachedUpload {
    name: String,
    size: u64,
    uri: String,
    mime_type: String,
    uploaded_at: String,
}

/// Per-user upload memory backed by append-only journal files
///
/// Re-sent attachments resolve to their existing remote URI instead of
/// re-uploading. Journals live at `{dir}/{user}.jsonl` and are loaded
/// once per user per process.
pub struct UploadCache {
    dir: PathBuf,
    entries: DashMap<String, CachedUpload>,
    loaded_users: DashMap<String, ()>,
}

impl UploadCache {
    /// Create a cache journaling into the given directory
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            entries: DashMap::new(),
            loaded_users: DashMap::new(),
        }
    }

    fn key(user_id: &str, name: &str, size: u64) -> String {
        format!("{user_id}:{name}:{size}")
    }

    fn journal_path(&self, user_id: &str) -> PathBuf {
        // User ids can contain path separators; flatten them
        let safe: String = user_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.jsonl"))
    }

    /// Load a user's journal on first touch
    async fn ensure_loaded(&self, user_id: &str) {
        if self.loaded_users.contains_key(user_id) {
            return;
        }

        if let Ok(raw) = tokio::fs::read_to_string(self.journal_path(user_id)).await {
            for line in raw.lines() {
                match serde_json::from_str::<CachedUpload>(line) {
                    Ok(entry) => {
                        self.entries
                            .insert(Self::key(user_id, &entry.name, entry.size), entry);
                    }
                    Err(e) => {
                        tracing::warn!(user_id = %user_id, error = %e, "skipping corrupt upload cache line");
                    }
                }
            }
        }

        self.loaded_users.insert(user_id.to_owned(), ());
    }

    /// Look up a remembered upload
    pub async fn get(&self, user_id: &str, name: &str, size: u64) -> Option<(String, String)> {
        self.ensure_loaded(user_id).await;
        self.entries
            .get(&Self::key(user_id, name, size))
            .map(|entry| (entry.uri.clone(), entry.mime_type.clone()))
    }

    /// Remember an upload and append it to the user's journal
    pub async fn put(&self, user_id: &str, name: &str, size: u64, uri: &str, mime_type: &str) {
        let entry = CachedUpload {
            name: name.to_owned(),
            size,
            uri: uri.to_owned(),
            mime_type: mime_type.to_owned(),
            uploaded_at: jiff::Timestamp::now().to_string(),
        };

        if let Ok(line) = serde_json::to_string(&entry) {
            let path = self.journal_path(user_id);
            if let Err(e) = append_line(&path, &line).await {
                tracing::warn!(path = %path.display(), error = %e, "failed to journal upload cache entry");
            }
        }

        self.entries.insert(Self::key(user_id, name, size), entry);
    }
}

async fn append_line(path: &std::path::Path, line: &str) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    Ok(())
}

/// Rewrites client messages into provider-ready history
pub struct AttachmentNormalizer {
    file_store: Option<Arc<dyn FileStore>>,
    cache: Arc<UploadCache>,
}

impl AttachmentNormalizer {
    /// Create a normalizer; without a file store, upload paths degrade
    /// to placeholders
    pub fn new(file_store: Option<Arc<dyn FileStore>>, cache: Arc<UploadCache>) -> Self {
        Self { file_store, cache }
    }

    /// Normalize a whole conversation against the target model
    pub async fn normalize(
        &self,
        messages: &[ChatMessage],
        model: &ResolvedModel,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<HistoryMessage>, LlmError> {
        let mut history = Vec::with_capacity(messages.len());
        for message in messages {
            history.push(self.normalize_message(message, model, user_id, cancel).await?);
        }
        Ok(history)
    }

    async fn normalize_message(
        &self,
        message: &ChatMessage,
        model: &ResolvedModel,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<HistoryMessage, LlmError> {
        if message.attachments.is_empty() {
            return Ok(HistoryMessage::text(message.role, message.content.clone()));
        }

        let mut parts = Vec::new();
        if !message.content.is_empty() {
            parts.push(ContentPart::Text {
                text: message.content.clone(),
            });
        }

        for attachment in &message.attachments {
            parts.push(self.normalize_attachment(attachment, model, user_id, cancel).await);
        }

        Ok(HistoryMessage {
            role: message.role,
            content: HistoryContent::Parts(parts),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        })
    }

    /// Resolve one attachment into a content part
    ///
    /// Infallible by contract: anything unusable comes back as a
    /// placeholder text part.
    async fn normalize_attachment(
        &self,
        attachment: &Attachment,
        model: &ResolvedModel,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> ContentPart {
        let kind = attachment.effective_kind();

        if !model.supports(kind) {
            return text_placeholder(kind, &attachment.name);
        }

        match (model.family, kind) {
            (_, AttachmentKind::Text) => match self.read_payload(attachment).await {
                Some(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => ContentPart::Text {
                        text: format!("[{}]\n{text}", attachment.name),
                    },
                    Err(_) => text_placeholder(kind, &attachment.name),
                },
                None => text_placeholder(kind, &attachment.name),
            },

            (ProviderFamily::Openai, AttachmentKind::Image) => match self.read_payload(attachment).await {
                Some(bytes) => ContentPart::Image {
                    url: data_uri(&attachment.mime_type, &bytes),
                },
                None => text_placeholder(kind, &attachment.name),
            },

            // OpenAI wire has no video slot; the model is told to steer
            // the user toward a capable model or a textual description
            (ProviderFamily::Openai, AttachmentKind::Video) => ContentPart::Text {
                text: format!(
                    "[附件[video]: {}] 当前模型无法处理视频，请建议用户切换到支持视频的模型，或提供视频内容的文字描述。",
                    attachment.name
                ),
            },

            // OpenAI wire has no rich slot for these even when the
            // catalog claims support
            (ProviderFamily::Openai, _) => text_placeholder(kind, &attachment.name),

            (ProviderFamily::Google, AttachmentKind::Image) if attachment.size <= GOOGLE_INLINE_LIMIT => {
                match self.read_payload(attachment).await {
                    Some(bytes) => ContentPart::Image {
                        url: data_uri(&attachment.mime_type, &bytes),
                    },
                    None => text_placeholder(kind, &attachment.name),
                }
            }

            (ProviderFamily::Google, AttachmentKind::Video) => {
                let whitelisted = attachment
                    .extension()
                    .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()));
                if !whitelisted || attachment.size > GOOGLE_VIDEO_LIMIT {
                    return text_placeholder(kind, &attachment.name);
                }
                self.upload_or_placeholder(attachment, kind, user_id, cancel).await
            }

            (ProviderFamily::Google, _) => self.upload_or_placeholder(attachment, kind, user_id, cancel).await,
        }
    }

    /// Upload through the file store, reusing any cached URI
    async fn upload_or_placeholder(
        &self,
        attachment: &Attachment,
        kind: AttachmentKind,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> ContentPart {
        let Some(store) = &self.file_store else {
            return text_placeholder(kind, &attachment.name);
        };

        if let Some((uri, mime_type)) = self.cache.get(user_id, &attachment.name, attachment.size).await {
            return ContentPart::FileRef { uri, mime_type };
        }

        let Some(bytes) = self.read_payload(attachment).await else {
            return text_placeholder(kind, &attachment.name);
        };

        let uploaded = match store.upload(&attachment.name, &attachment.mime_type, bytes).await {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(name = %attachment.name, error = %e, "attachment upload failed");
                return text_placeholder(kind, &attachment.name);
            }
        };

        match wait_until_active(store.as_ref(), uploaded, cancel).await {
            Ok(active) => {
                self.cache
                    .put(user_id, &attachment.name, attachment.size, &active.uri, &active.mime_type)
                    .await;
                ContentPart::FileRef {
                    uri: active.uri,
                    mime_type: active.mime_type,
                }
            }
            Err(e) => {
                tracing::warn!(name = %attachment.name, error = %e, "uploaded attachment never became active");
                text_placeholder(kind, &attachment.name)
            }
        }
    }

    /// Read the raw payload from inline base64 or a server-side path
    async fn read_payload(&self, attachment: &Attachment) -> Option<Vec<u8>> {
        if let Some(data) = &attachment.data {
            return match BASE64.decode(data) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!(name = %attachment.name, error = %e, "attachment payload is not valid base64");
                    None
                }
            };
        }

        if let Some(path) = &attachment.path {
            return match tokio::fs::read(path).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read attachment file");
                    None
                }
            };
        }

        None
    }
}

fn text_placeholder(kind: AttachmentKind, name: &str) -> ContentPart {
    ContentPart::Text {
        text: placeholder(kind, name),
    }
}

fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
}
