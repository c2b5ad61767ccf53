pub mod registry;
pub mod traits;

pub use registry::ToolRegistry;
pub use traits::{Endpoint, Tool, ToolDefinition};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::ToolError;
use crate::schema;
use crate::types::Content;

// ---------------------------------------------------------------------------
// Handler adapter
// ---------------------------------------------------------------------------

/// Wraps a typed [`Endpoint`] as a dispatchable [`Tool`].
///
/// The input schema is generated once from `E::Input` and used both for the
/// descriptor and for validating every call.
pub struct EndpointTool<E: Endpoint> {
    endpoint: E,
    schema: Value,
}

impl<E: Endpoint> EndpointTool<E> {
    pub fn new(endpoint: E) -> Self {
        Self {
            endpoint,
            schema: schema::input_schema::<E::Input>(),
        }
    }

    async fn run(&self, args: &Value) -> Result<Vec<Content>, ToolError> {
        let input: E::Input = schema::parse_with(&self.schema, args.clone())?;
        debug!(tool = self.endpoint.name(), "arguments validated");

        let output = self.endpoint.fetch(input).await?;
        Ok(vec![Content::text(render(&output)?)])
    }
}

#[async_trait]
impl<E: Endpoint> Tool for EndpointTool<E> {
    fn name(&self) -> &str {
        self.endpoint.name()
    }

    fn description(&self) -> &str {
        self.endpoint.description()
    }

    fn parameters_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn execute(&self, args: Option<Value>) -> Result<Vec<Content>, ToolError> {
        let args = args.unwrap_or_else(|| Value::Object(Map::new()));
        let result = self.run(&args).await;
        if let Err(e) = &result {
            error!(tool = self.endpoint.name(), args = %args, error = %e, "tool call failed");
        }
        result
    }
}

/// Render a parsed response as the text handed back to the caller.
pub fn render<T: Serialize>(output: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(output).map_err(|e| ToolError::ResponseParse {
        path: ".".into(),
        message: format!("failed to render response: {e}"),
    })
}
