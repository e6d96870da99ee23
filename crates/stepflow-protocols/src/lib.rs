//! # Stepflow Protocols
//!
//! Core protocol definitions (traits and data types) for the stepflow
//! framework. Contains only interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`Tool`] - Trait for tool implementations
//! - [`ChatProvider`] - Trait for model backend implementations
//! - [`Memory`] - Trait for conversation history storage

pub mod cancellation;
pub mod error;
pub mod memory;
pub mod provider;
pub mod tool;
pub mod types;

// Re-export core traits
pub use cancellation::CancellationToken;
pub use error::{
    AgentError, BoxError, ParseError, ProviderError, RegistryError, ToolError, WorkflowError,
};
pub use memory::{ConversationMemory, Memory};
pub use provider::{ChatProvider, ChatRequest, ChatResponse};
pub use tool::{Tool, ToolContext, ToolDefinition, ToolResult};
pub use types::{Message, MessageRole};
