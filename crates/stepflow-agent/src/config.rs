//! Agent execution configuration.

use stepflow_protocols::cancellation::CancellationToken;

/// Limits applied to one agent run.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Maximum number of reason-act iterations before the run fails.
    pub max_iterations: u32,

    /// Maximum retries for a single failed unit of work.
    pub max_retries_per_step: u32,

    /// Cumulative retry ceiling across the whole run.
    pub total_max_retries: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            max_retries_per_step: 3,
            total_max_retries: 10,
        }
    }
}

impl ExecutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_max_retries_per_step(mut self, max: u32) -> Self {
        self.max_retries_per_step = max;
        self
    }

    pub fn with_total_max_retries(mut self, max: u32) -> Self {
        self.total_max_retries = max;
        self
    }
}

/// Options controlling one agent run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Cancellation signal polled at iteration boundaries and before tool
    /// execution.
    pub signal: Option<CancellationToken>,

    /// Execution limits for this run.
    pub execution: ExecutionConfig,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }
}
