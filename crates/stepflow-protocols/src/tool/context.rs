//! Per-invocation tool execution context.

use uuid::Uuid;

use crate::cancellation::CancellationToken;

/// Context handed to a tool for one invocation.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Identifier of the run this invocation belongs to.
    pub run_id: String,

    /// Identifier unique to this invocation, for log correlation.
    pub correlation_id: String,

    /// Cancellation signal shared with the run.
    pub signal: CancellationToken,
}

impl ToolContext {
    /// Create a context for a run, minting a fresh correlation id.
    pub fn new(run_id: impl Into<String>, signal: CancellationToken) -> Self {
        Self {
            run_id: run_id.into(),
            correlation_id: Uuid::new_v4().to_string(),
            signal,
        }
    }

    /// Whether the owning run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.signal.is_cancelled()
    }
}
