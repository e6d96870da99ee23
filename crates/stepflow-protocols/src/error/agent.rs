//! Agent runner errors.

use thiserror::Error;

use super::{ParseError, ProviderError, ToolError};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Runner is already initialized")]
    AlreadyInitialized,

    #[error("Runner has not been initialized")]
    NotInitialized,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Retries exhausted after {attempts} attempts: {cause}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        cause: Box<AgentError>,
    },

    #[error("Iteration limit of {0} reached without a final answer")]
    IterationLimit(u32),
}
