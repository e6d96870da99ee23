//! Conversation memory.

use crate::types::Message;

/// Ordered storage for a run's conversation history.
pub trait Memory: Send + Sync {
    /// Append a message to the history.
    fn add(&mut self, message: Message);

    /// The full history, oldest first.
    fn messages(&self) -> &[Message];

    /// Number of stored messages.
    fn len(&self) -> usize {
        self.messages().len()
    }

    /// Whether the history is empty.
    fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }
}

/// In-memory, append-only conversation history.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    messages: Vec<Message>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Memory for ConversationMemory {
    fn add(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn messages(&self) -> &[Message] {
        &self.messages
    }
}
