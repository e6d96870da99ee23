//! Tool dispatch with schema validation.

use std::sync::Arc;

use dashmap::DashMap;
use jsonschema::Validator;
use serde_json::Value;
use tracing::debug;

use stepflow_core::registry::ToolRegistry;
use stepflow_protocols::error::ToolError;
use stepflow_protocols::tool::{ToolContext, ToolDefinition, ToolResult};

use crate::parser::ToolCall;

/// Resolves parsed tool calls against a registry and executes them.
///
/// When a tool declares an input schema, the call input is validated
/// against it before the tool runs. Compiled validators are cached per
/// tool name, since definitions do not change after registration. The
/// cancellation signal is checked last, immediately before execution.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    validators: DashMap<String, Arc<Validator>>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            validators: DashMap::new(),
        }
    }

    /// Definitions of every registered tool.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.list()
    }

    /// Resolve, validate, and execute one tool call.
    pub async fn dispatch(&self, call: &ToolCall, ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let tool = self
            .registry
            .get(&call.tool_name)
            .ok_or_else(|| ToolError::NotFound(call.tool_name.clone()))?;

        if let Some(schema) = &tool.definition().input_schema {
            let validator = self.validator_for(&call.tool_name, schema)?;
            validator
                .validate(&call.tool_input)
                .map_err(|e| ToolError::ValidationFailed(e.to_string()))?;
        }

        if ctx.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        debug!(tool = %call.tool_name, correlation_id = %ctx.correlation_id, "dispatching tool call");
        tool.execute(call.tool_input.clone(), ctx).await
    }

    /// Compile the schema for `tool_name`, or reuse a previously compiled
    /// validator.
    fn validator_for(&self, tool_name: &str, schema: &Value) -> Result<Arc<Validator>, ToolError> {
        if let Some(validator) = self.validators.get(tool_name) {
            return Ok(validator.clone());
        }
        let validator = Arc::new(
            jsonschema::validator_for(schema)
                .map_err(|e| ToolError::ValidationFailed(format!("invalid schema: {e}")))?,
        );
        self.validators
            .insert(tool_name.to_string(), validator.clone());
        Ok(validator)
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
