//! Chat completion responses.

use serde::{Deserialize, Serialize};

/// Output of one chat completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Raw model output text.
    pub text: String,
}

impl ChatResponse {
    /// Wrap raw model output.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
