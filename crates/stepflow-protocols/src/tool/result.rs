//! Tool execution results.

use serde::{Deserialize, Serialize};

/// Output of a successful tool execution.
///
/// The content is fed back to the model verbatim as the observation for the
/// iteration that invoked the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Textual observation produced by the tool.
    pub content: String,
}

impl ToolResult {
    /// Wrap tool output as a result.
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
