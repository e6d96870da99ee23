//! Error types for the stepflow framework.

mod agent;
mod parse;
mod provider;
mod registry;
mod tool;
mod workflow;

pub use agent::AgentError;
pub use parse::ParseError;
pub use provider::ProviderError;
pub use registry::RegistryError;
pub use tool::ToolError;
pub use workflow::WorkflowError;

/// Boxed error type for failures originating in caller-provided code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
