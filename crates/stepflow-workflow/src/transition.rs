//! Step transitions.

/// Where the executor goes after a step completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Continue with the step that follows in registration order.
    ///
    /// Returned from the last registered step, this ends the run.
    Next,

    /// End the run immediately.
    End,

    /// Jump to the step with the given name.
    Goto(String),
}

impl Transition {
    /// Jump to a named step.
    pub fn goto(step: impl Into<String>) -> Self {
        Transition::Goto(step.into())
    }
}
