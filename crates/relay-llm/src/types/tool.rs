use serde_json::Value;

use relay_tools::ToolRegistry;

/// Declaration of one tool as advertised to a provider
#[derive(Debug, Clone)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,
    /// Description shown to the model
    pub description: String,
    /// JSON Schema for parameters
    pub parameters: Value,
}

impl ToolSchema {
    /// Snapshot every registered tool as provider-ready declarations
    pub fn from_registry(registry: &ToolRegistry) -> Vec<Self> {
        registry
            .list()
            .into_iter()
            .map(|def| Self {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            })
            .collect()
    }
}
