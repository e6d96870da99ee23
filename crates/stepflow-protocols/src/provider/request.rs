//! Chat completion requests.

use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Input to one chat completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation history, oldest first.
    pub messages: Vec<Message>,

    /// Optional system prompt applied ahead of the history.
    pub system: Option<String>,
}

impl ChatRequest {
    /// Create a request from a conversation history.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            system: None,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}
