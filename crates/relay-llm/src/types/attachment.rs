use std::path::PathBuf;

use serde::Deserialize;

/// Closed set of attachment kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Raster image
    Image,
    /// Video file
    Video,
    /// Rich document (pdf, docx, ...)
    Document,
    /// Plain text file
    Text,
    /// Anything unrecognized
    Binary,
}

impl AttachmentKind {
    /// Lowercase name used in placeholders and config
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Text => "text",
            Self::Binary => "binary",
        }
    }

    /// Parse a config-level kind name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "document" => Some(Self::Document),
            "text" => Some(Self::Text),
            "binary" => Some(Self::Binary),
            _ => None,
        }
    }
}

/// MIME prefixes and exact types mapped to kinds
///
/// The effective kind of an attachment is always derived through this
/// table; the client-declared kind is never trusted. Unknown MIME types
/// degrade to `Binary`.
const MIME_TABLE: &[(&str, AttachmentKind)] = &[
    ("image/jpeg", AttachmentKind::Image),
    ("image/png", AttachmentKind::Image),
    ("image/gif", AttachmentKind::Image),
    ("image/webp", AttachmentKind::Image),
    ("image/heic", AttachmentKind::Image),
    ("image/heif", AttachmentKind::Image),
    ("video/mp4", AttachmentKind::Video),
    ("video/mpeg", AttachmentKind::Video),
    ("video/quicktime", AttachmentKind::Video),
    ("video/x-msvideo", AttachmentKind::Video),
    ("video/x-flv", AttachmentKind::Video),
    ("video/webm", AttachmentKind::Video),
    ("video/x-ms-wmv", AttachmentKind::Video),
    ("video/3gpp", AttachmentKind::Video),
    ("application/pdf", AttachmentKind::Document),
    ("application/msword", AttachmentKind::Document),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        AttachmentKind::Document,
    ),
    ("text/plain", AttachmentKind::Text),
    ("text/markdown", AttachmentKind::Text),
    ("text/csv", AttachmentKind::Text),
];

/// Resolve the effective kind for a MIME type
pub fn kind_for_mime(mime_type: &str) -> AttachmentKind {
    let normalized = mime_type.trim().to_ascii_lowercase();

    if let Some((_, kind)) = MIME_TABLE.iter().find(|(m, _)| *m == normalized) {
        return *kind;
    }

    // Fall back on the major type for unlisted subtypes
    match normalized.split('/').next() {
        Some("text") => AttachmentKind::Text,
        _ => AttachmentKind::Binary,
    }
}

/// One attachment reference as submitted by the client
///
/// Owned by its message for the duration of one request; never mutated
/// after normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    /// Display name (usually the original filename)
    pub name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Payload size in bytes
    #[serde(default)]
    pub size: u64,
    /// Inline base64 payload
    #[serde(default)]
    pub data: Option<String>,
    /// Local filesystem path, for server-side files
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Attachment {
    /// The effective kind, derived from the MIME type
    pub fn effective_kind(&self) -> AttachmentKind {
        kind_for_mime(&self.mime_type)
    }

    /// File extension of the display name, lowercased
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}
