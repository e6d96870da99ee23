//! Workflow definition and execution.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use stepflow_core::emitter::Emitter;
use stepflow_core::events::RunEvent;
use stepflow_protocols::cancellation::CancellationToken;
use stepflow_protocols::error::{BoxError, WorkflowError};

use crate::transition::Transition;

/// Outcome of one step invocation.
pub type StepResult = Result<Transition, BoxError>;

/// Future returned by a step function, borrowing the run state.
pub type StepFuture<'a> = BoxFuture<'a, StepResult>;

type StepFn<S> = Box<dyn for<'a> Fn(&'a mut S) -> StepFuture<'a> + Send + Sync>;

struct StepEntry<S> {
    name: String,
    func: StepFn<S>,
}

/// Options controlling one workflow run.
pub struct WorkflowOptions {
    /// Step to begin with. Defaults to the first registered step.
    pub start_step: Option<String>,

    /// Ceiling on total step invocations, counting revisits. Exceeding it
    /// fails the run with [`WorkflowError::Overrun`].
    pub max_step_invocations: u32,

    /// Cancellation signal polled before each step.
    pub signal: Option<CancellationToken>,

    /// Event sink for run progress.
    pub emitter: Option<Arc<Emitter>>,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            start_step: None,
            max_step_invocations: 100,
            signal: None,
            emitter: None,
        }
    }
}

impl WorkflowOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin the run at a named step instead of the first one.
    pub fn with_start_step(mut self, step: impl Into<String>) -> Self {
        self.start_step = Some(step.into());
        self
    }

    /// Override the step invocation ceiling.
    pub fn with_max_step_invocations(mut self, max: u32) -> Self {
        self.max_step_invocations = max;
        self
    }

    /// Attach a cancellation signal.
    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Attach an event emitter.
    pub fn with_emitter(mut self, emitter: Arc<Emitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }
}

/// How a run ended, other than by error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The run reached an end transition or ran off the last step.
    Completed,

    /// The run observed its cancellation signal and stopped early.
    Cancelled { reason: Option<String> },
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunStatus::Cancelled { .. })
    }
}

/// Result of a finished workflow run.
#[derive(Debug)]
pub struct WorkflowRun<S> {
    /// Final state after the last executed step.
    pub state: S,

    /// Names of executed steps in execution order, revisits included.
    pub steps_executed: Vec<String>,

    /// How the run ended.
    pub status: RunStatus,
}

/// An ordered collection of named steps over a shared state.
///
/// Steps execute one at a time. Each returns a [`Transition`] choosing the
/// next step, so a run may revisit steps or skip ahead by name.
pub struct Workflow<S> {
    name: String,
    steps: Vec<StepEntry<S>>,
}

impl<S: Send> Workflow<S> {
    /// Create an empty workflow.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// The workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of registered steps, in registration order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Register a step under a unique name.
    ///
    /// Returns [`WorkflowError::DuplicateStep`] if the name is taken.
    pub fn add_step<F>(&mut self, name: impl Into<String>, func: F) -> Result<&mut Self, WorkflowError>
    where
        F: for<'a> Fn(&'a mut S) -> StepFuture<'a> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.steps.iter().any(|s| s.name == name) {
            return Err(WorkflowError::DuplicateStep(name));
        }
        self.steps.push(StepEntry {
            name,
            func: Box::new(func),
        });
        Ok(self)
    }

    /// Run the workflow with default options.
    pub async fn run(&self, state: S) -> Result<WorkflowRun<S>, WorkflowError> {
        self.run_with_options(state, WorkflowOptions::default()).await
    }

    /// Run the workflow from the configured start step until a step ends
    /// the run, execution falls off the last step, the run is cancelled,
    /// or a failure occurs.
    pub async fn run_with_options(
        &self,
        mut state: S,
        options: WorkflowOptions,
    ) -> Result<WorkflowRun<S>, WorkflowError> {
        let run_id = Uuid::new_v4().to_string();
        info!(workflow = %self.name, %run_id, "starting workflow run");

        emit(&options.emitter, RunEvent::Start { run_id });

        let mut idx = match &options.start_step {
            Some(start) => self.index_of(start).ok_or_else(|| {
                emit_error(&options.emitter, &format!("unknown start step: {start}"));
                WorkflowError::UnknownStep(start.clone())
            })?,
            None => 0,
        };

        let mut steps_executed: Vec<String> = Vec::new();
        let mut executed: u32 = 0;

        while idx < self.steps.len() {
            if let Some(reason) = cancelled_reason(&options.signal) {
                info!(workflow = %self.name, "workflow run cancelled");
                emit(&options.emitter, RunEvent::Cancelled { reason: reason.clone() });
                return Ok(WorkflowRun {
                    state,
                    steps_executed,
                    status: RunStatus::Cancelled { reason },
                });
            }

            if executed >= options.max_step_invocations {
                warn!(workflow = %self.name, limit = options.max_step_invocations, "step invocation ceiling hit");
                emit_error(
                    &options.emitter,
                    &WorkflowError::Overrun(options.max_step_invocations).to_string(),
                );
                return Err(WorkflowError::Overrun(options.max_step_invocations));
            }

            let entry = &self.steps[idx];
            debug!(workflow = %self.name, step = %entry.name, "executing step");
            emit(&options.emitter, RunEvent::StepStart { step: entry.name.clone() });

            let transition = match (entry.func)(&mut state).await {
                Ok(transition) => transition,
                Err(source) => {
                    emit(
                        &options.emitter,
                        RunEvent::StepError {
                            step: entry.name.clone(),
                            error: source.to_string(),
                        },
                    );
                    emit_error(&options.emitter, &source.to_string());
                    return Err(WorkflowError::StepFailed {
                        step: entry.name.clone(),
                        source,
                    });
                }
            };

            emit(&options.emitter, RunEvent::StepSuccess { step: entry.name.clone() });
            steps_executed.push(entry.name.clone());
            executed += 1;

            match transition {
                Transition::Next => idx += 1,
                Transition::End => break,
                Transition::Goto(target) => {
                    idx = self.index_of(&target).ok_or_else(|| {
                        emit_error(&options.emitter, &format!("unknown step: {target}"));
                        WorkflowError::UnknownStep(target.clone())
                    })?;
                }
            }
        }

        info!(workflow = %self.name, steps = executed, "workflow run completed");
        emit(
            &options.emitter,
            RunEvent::Success {
                value: json!({ "steps_executed": steps_executed }),
            },
        );
        Ok(WorkflowRun {
            state,
            steps_executed,
            status: RunStatus::Completed,
        })
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }
}

fn emit(emitter: &Option<Arc<Emitter>>, event: RunEvent) {
    if let Some(emitter) = emitter {
        emitter.emit(event);
    }
}

fn emit_error(emitter: &Option<Arc<Emitter>>, error: &str) {
    emit(
        emitter,
        RunEvent::Error {
            error: error.to_string(),
        },
    );
}

fn cancelled_reason(signal: &Option<CancellationToken>) -> Option<Option<String>> {
    match signal {
        Some(signal) if signal.is_cancelled() => {
            Some(signal.reason().map(str::to_string))
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
