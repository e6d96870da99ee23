//! Tool definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Static description of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name, used by the model to address the tool.
    pub name: String,

    /// Human-readable description surfaced to the model.
    pub description: String,

    /// JSON Schema for the tool input. `None` means any input is accepted.
    pub input_schema: Option<Value>,
}

impl ToolDefinition {
    /// Create a definition without an input schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
        }
    }

    /// Attach a JSON Schema for input validation.
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Derive the input schema from a type implementing [`JsonSchema`].
    pub fn with_input_schema_for<T: JsonSchema>(mut self) -> Self {
        self.input_schema = serde_json::to_value(schemars::schema_for!(T)).ok();
        self
    }
}
