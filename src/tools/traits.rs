//! Tool trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::schema::ToolInput;
use crate::types::Content;

/// Descriptor of a tool as advertised to the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Object-safe tool interface the registry stores and dispatches to.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (unique within a registry).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool. `None` is treated as an empty argument mapping.
    async fn execute(&self, args: Option<serde_json::Value>) -> Result<Vec<Content>, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// A single upstream endpoint with a typed input and output.
///
/// Implementors only fetch; validation, rendering and error logging are done
/// once for all endpoints by [`super::EndpointTool`].
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    type Input: ToolInput;
    type Output: Serialize + Send;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    async fn fetch(&self, input: Self::Input) -> Result<Self::Output, ToolError>;
}
