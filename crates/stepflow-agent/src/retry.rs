//! Retry classification and budgeting.

use stepflow_protocols::error::{AgentError, ToolError};

/// Check if an error may be retried within the same iteration.
///
/// Parse failures, provider failures, and ordinary tool failures are
/// recoverable: the model can be asked again, or the call re-executed.
/// Cancellation and lifecycle errors are final.
pub fn is_recoverable(error: &AgentError) -> bool {
    match error {
        AgentError::Parse(_) => true,
        AgentError::Provider(_) => true,
        AgentError::Tool(tool_error) => match tool_error {
            ToolError::NotFound(_) => true,
            ToolError::ValidationFailed(_) => true,
            ToolError::ExecutionFailed(_) => true,
            ToolError::Cancelled => false,
        },
        _ => false,
    }
}

/// Tracks retry spend for one run.
///
/// A retry is allowed only while both the per-unit limit and the cumulative
/// run-wide limit have headroom. The per-unit counter is owned by the call
/// site and reset for each fresh unit of work.
#[derive(Debug)]
pub struct RetryBudget {
    per_step_limit: u32,
    total_limit: u32,
    total_used: u32,
}

impl RetryBudget {
    pub fn new(per_step_limit: u32, total_limit: u32) -> Self {
        Self {
            per_step_limit,
            total_limit,
            total_used: 0,
        }
    }

    /// Try to spend one retry against both limits.
    ///
    /// Returns `true` and records the spend if allowed.
    pub fn allow_retry(&mut self, per_step_used: &mut u32) -> bool {
        if *per_step_used >= self.per_step_limit || self.total_used >= self.total_limit {
            return false;
        }
        *per_step_used += 1;
        self.total_used += 1;
        true
    }

    /// Retries spent so far across the whole run.
    pub fn total_used(&self) -> u32 {
        self.total_used
    }
}
