use thiserror::Error;

/// Errors raised by the tool subsystem
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with this name is registered
    #[error("tool not found: {name}")]
    NotFound {
        /// The unresolved tool name
        name: String,
    },

    /// A tool with this name is already registered
    #[error("duplicate tool: {name}")]
    Duplicate {
        /// The colliding tool name
        name: String,
    },

    /// Tool implementation failed during execution
    #[error("tool execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    /// Short machine-readable name for this error variant
    ///
    /// Carried in the `error_type` field of error-shaped final results.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "UnknownTool",
            Self::Duplicate { .. } => "DuplicateTool",
            Self::Execution(_) => "ExecutionError",
        }
    }
}
