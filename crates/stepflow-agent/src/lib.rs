//! # Stepflow Agent
//!
//! An iterative reason-act runner: each iteration asks the model what to do
//! next, parses the reply into either a tool invocation or a final answer,
//! executes the tool, and feeds the observation back into the conversation.

pub mod config;
pub mod dispatcher;
pub mod parser;
pub mod retry;
pub mod runner;

pub use config::{ExecutionConfig, RunOptions};
pub use dispatcher::ToolDispatcher;
pub use parser::{parse_output, IterationResult, ToolCall};
pub use retry::{is_recoverable, RetryBudget};
pub use runner::{ReactRunner, RunOutcome, RunOutput};
