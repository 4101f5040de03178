use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::Stream;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ToolError;
use crate::event::{ToolEvent, ToolFinal};

/// Output of one tool call before invoker normalization
pub enum ToolOutput {
    /// Synchronous tool: a single final result
    Final(ToolFinal),
    /// Progressive tool: a finite sequence of steps then a final
    Stream(Pin<Box<dyn Stream<Item = ToolEvent> + Send>>),
}

/// Trait implemented by each executable tool
///
/// Arguments arrive already parsed from the model's JSON; schemas are
/// advisory to the model and deliberately not re-validated here.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with parsed arguments
    async fn call(&self, args: serde_json::Map<String, Value>) -> Result<ToolOutput, ToolError>;
}

/// A registered tool: declaration plus implementation handle
#[derive(Clone)]
pub struct ToolDefinition {
    /// Unique tool name
    pub name: String,
    /// Description shown to the model
    pub description: String,
    /// JSON Schema for the tool's parameters
    pub parameters: Value,
    /// Executable implementation
    pub handler: Arc<dyn Tool>,
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Immutable catalog of executable tools
///
/// Built once at startup and shared read-only across requests, so
/// concurrent `resolve` calls need no locking.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Start building a registry
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Look up a tool by name
    pub fn resolve(&self, name: &str) -> Result<&ToolDefinition, ToolError> {
        self.tools.get(name).ok_or_else(|| ToolError::NotFound {
            name: name.to_owned(),
        })
    }

    /// All registered tools in registration order
    ///
    /// Stable ordering makes the returned slice safe to hand directly
    /// to a provider as its tool-schema declaration.
    pub fn list(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }

    /// Whether no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Builder enforcing name uniqueness at registration time
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: IndexMap<String, ToolDefinition>,
}

impl ToolRegistryBuilder {
    /// Register a tool definition
    ///
    /// # Errors
    ///
    /// Returns `ToolError::Duplicate` if the name is already registered
    pub fn register(&mut self, definition: ToolDefinition) -> Result<(), ToolError> {
        if self.tools.contains_key(&definition.name) {
            return Err(ToolError::Duplicate {
                name: definition.name,
            });
        }
        self.tools.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Freeze the builder into an immutable registry
    pub fn build(self) -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry { tools: self.tools })
    }
}
