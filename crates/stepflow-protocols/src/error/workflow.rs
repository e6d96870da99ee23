//! Workflow executor errors.

use thiserror::Error;

use super::BoxError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Duplicate step name: {0}")]
    DuplicateStep(String),

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Step invocation ceiling of {0} exceeded")]
    Overrun(u32),

    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: BoxError,
    },
}
