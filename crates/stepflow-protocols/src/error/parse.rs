//! Action parser errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Model output was empty")]
    EmptyOutput,

    #[error("Invalid JSON in model output: {0}")]
    InvalidJson(String),

    #[error("Model output contains no recognizable action")]
    MissingAction,
}
