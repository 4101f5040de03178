//! Streaming chat core for Relay
//!
//! Normalizes client conversations against heterogeneous upstream
//! providers (OpenAI-compatible and Google-style), demultiplexes their
//! token streams, orchestrates mid-stream tool invocations, and exposes
//! the whole exchange to clients as one ordered SSE byte stream.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod attach;
pub mod catalog;
pub mod convert;
pub mod demux;
pub mod error;
pub mod files;
pub mod handler;
pub mod protocol;
pub mod provider;
pub mod sse;
pub mod state;
pub mod types;

pub use catalog::{ModelCatalog, ResolvedModel};
pub use error::LlmError;
pub use handler::chat_router;
pub use provider::{ChatProvider, ProviderFamily};
pub use state::LlmState;
pub use types::{ChatEvent, ChatMessage, ProviderEvent};
