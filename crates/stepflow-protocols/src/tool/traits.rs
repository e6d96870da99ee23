//! The tool trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;

use super::{ToolContext, ToolDefinition, ToolResult};

/// A capability the agent can invoke during a run.
///
/// Implementations describe themselves through [`ToolDefinition`]; the
/// definition's input schema, when present, is enforced by the dispatcher
/// before `execute` is called.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Static description of the tool, including its name and input schema.
    fn definition(&self) -> &ToolDefinition;

    /// Execute the tool against validated input.
    async fn execute(&self, input: Value, ctx: ToolContext) -> Result<ToolResult, ToolError>;
}
