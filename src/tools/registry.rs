//! Tool registry: name -> tool lookup plus the ordered descriptor list.
//!
//! Built once at startup and shared read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::ToolError;
use crate::tools::traits::{Endpoint, Tool, ToolDefinition};
use crate::tools::EndpointTool;
use crate::types::Content;

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A second tool with the same name is rejected.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        debug!(tool = %name, "registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(Arc::new(tool));
        Ok(())
    }

    /// Register a typed endpoint through the generic handler adapter.
    pub fn register_endpoint<E: Endpoint>(&mut self, endpoint: E) -> Result<(), ToolError> {
        self.register(EndpointTool::new(endpoint))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    /// Descriptors in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up `name` and execute it.
    pub async fn call(&self, name: &str, args: Option<Value>) -> Result<Vec<Content>, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(args).await
    }
}
