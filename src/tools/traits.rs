//! Tool trait definition.

use super::schema::ValidationError;
use crate::types::{ResponseEnvelope, ToolArguments};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Definition of a tool as advertised to MCP clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// A named, schema-validated operation callable by an agent.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (unique within a registry).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Check and normalize a raw argument payload.
    fn validate(&self, raw: &serde_json::Value) -> Result<ToolArguments, ValidationError>;

    /// Execute the tool with already-validated arguments.
    async fn execute(&self, args: ToolArguments) -> ResponseEnvelope;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }

    /// Validate, then execute. Only a validation failure is returned as `Err`.
    async fn invoke(&self, raw: &serde_json::Value) -> Result<ResponseEnvelope, ValidationError> {
        let args = self.validate(raw)?;
        Ok(self.execute(args).await)
    }
}
