//! Tool registry and invocation for Relay
//!
//! Tools are registered once at startup into an immutable registry and
//! invoked mid-generation when a model requests them. Every invocation
//! produces zero or more progress steps followed by exactly one final
//! result, regardless of how the tool implementation behaves.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod builtin;
pub mod error;
pub mod event;
pub mod invoker;
pub mod registry;

pub use builtin::default_registry;
pub use error::ToolError;
pub use event::{ToolEvent, ToolFinal, ToolStatus, ToolStep};
pub use invoker::invoke;
pub use registry::{Tool, ToolDefinition, ToolOutput, ToolRegistry};
