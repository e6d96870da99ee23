//! # Stepflow Workflow
//!
//! A workflow is an ordered collection of named steps sharing one mutable
//! state value. Each step returns a [`Transition`] telling the executor
//! where to go next: fall through to the following step, jump to a named
//! step, or end the run.

pub mod transition;
pub mod workflow;

pub use transition::Transition;
pub use workflow::{
    RunStatus, StepFuture, StepResult, Workflow, WorkflowOptions, WorkflowRun,
};
