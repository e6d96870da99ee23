//! Iterative reason-act runner.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use stepflow_core::emitter::Emitter;
use stepflow_core::events::{IterationMeta, RunEvent};
use stepflow_core::registry::{ProviderRegistry, ToolRegistry};
use stepflow_protocols::cancellation::CancellationToken;
use stepflow_protocols::error::{AgentError, RegistryError, ToolError};
use stepflow_protocols::memory::{ConversationMemory, Memory};
use stepflow_protocols::provider::{ChatProvider, ChatRequest};
use stepflow_protocols::tool::{ToolContext, ToolDefinition, ToolResult};
use stepflow_protocols::types::Message;

use crate::config::RunOptions;
use crate::dispatcher::ToolDispatcher;
use crate::parser::{parse_output, IterationResult, ToolCall};
use crate::retry::{is_recoverable, RetryBudget};

/// How a run ended, other than by error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model produced a final answer.
    Completed { answer: String },

    /// The run observed its cancellation signal and stopped early.
    Cancelled { reason: Option<String> },
}

impl RunOutcome {
    /// The final answer, if the run completed.
    pub fn answer(&self) -> Option<&str> {
        match self {
            RunOutcome::Completed { answer } => Some(answer),
            RunOutcome::Cancelled { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled { .. })
    }
}

/// Result of a finished agent run.
#[derive(Debug)]
pub struct RunOutput {
    /// Identifier minted for this run.
    pub run_id: String,

    /// How the run ended.
    pub outcome: RunOutcome,

    /// Number of fully completed iterations.
    pub iterations: u32,
}

/// Drives the reason-act loop against a chat provider and a tool registry.
///
/// Each iteration asks the model what to do next, then either executes the
/// requested tool and feeds the observation back into the conversation, or
/// finishes the run with the model's final answer.
pub struct ReactRunner {
    provider: Arc<dyn ChatProvider>,
    dispatcher: ToolDispatcher,
    memory: Box<dyn Memory>,
    emitter: Arc<Emitter>,
    system_prompt: Option<String>,
    initialized: bool,
}

impl ReactRunner {
    /// Create a runner over a provider and a tool registry.
    pub fn new(provider: Arc<dyn ChatProvider>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            dispatcher: ToolDispatcher::new(registry),
            memory: Box::new(ConversationMemory::new()),
            emitter: Arc::new(Emitter::new()),
            system_prompt: None,
            initialized: false,
        }
    }

    /// Create a runner by looking the provider up in a registry.
    ///
    /// Provider selection happens here, at configuration time; the runner
    /// itself never consults the registry again.
    pub fn from_registry(
        providers: &ProviderRegistry,
        provider_id: &str,
        tools: Arc<ToolRegistry>,
    ) -> Result<Self, RegistryError> {
        let provider = providers
            .get(provider_id)
            .ok_or_else(|| RegistryError::NotFound(provider_id.to_string()))?;
        Ok(Self::new(provider, tools))
    }

    /// Replace the generated system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Replace the default in-memory conversation store.
    pub fn with_memory(mut self, memory: Box<dyn Memory>) -> Self {
        self.memory = memory;
        self
    }

    /// Replace the event emitter.
    ///
    /// The emitter belongs to the runner, not to a single run: subscribers
    /// stay registered across consecutive [`run`](Self::run) calls and see
    /// the events of each, distinguishable by the `Start` event's run id.
    pub fn with_emitter(mut self, emitter: Arc<Emitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// The runner's event emitter, for subscribing to run progress.
    ///
    /// Shared across every run of this runner; see
    /// [`with_emitter`](Self::with_emitter).
    pub fn emitter(&self) -> &Arc<Emitter> {
        &self.emitter
    }

    /// The conversation history accumulated so far.
    pub fn history(&self) -> &[Message] {
        self.memory.messages()
    }

    /// Seed the conversation with the system prompt and the user input.
    ///
    /// Returns [`AgentError::AlreadyInitialized`] on a second call; further
    /// inputs go through [`run`](Self::run), which appends them as user
    /// turns.
    pub fn init(&mut self, input: &str) -> Result<(), AgentError> {
        if self.initialized {
            return Err(AgentError::AlreadyInitialized);
        }
        let prompt = match &self.system_prompt {
            Some(prompt) => prompt.clone(),
            None => default_system_prompt(&self.dispatcher.definitions()),
        };
        self.memory.add(Message::system(prompt));
        self.memory.add(Message::user(input));
        self.initialized = true;
        Ok(())
    }

    /// Ask the model what to do next and parse its reply.
    ///
    /// Requires [`init`](Self::init) to have seeded the conversation.
    pub async fn step(&self, meta: IterationMeta) -> Result<IterationResult, AgentError> {
        if !self.initialized {
            return Err(AgentError::NotInitialized);
        }
        let request = ChatRequest::new(self.memory.messages().to_vec());
        let response = self.provider.complete(request).await?;
        debug!(iteration = meta.iteration, chars = response.text.len(), "model replied");
        Ok(parse_output(&response.text)?)
    }

    /// Execute one parsed tool call.
    pub async fn tool(
        &self,
        call: &ToolCall,
        signal: &CancellationToken,
        run_id: &str,
    ) -> Result<ToolResult, AgentError> {
        let ctx = ToolContext::new(run_id, signal.clone());
        Ok(self.dispatcher.dispatch(call, ctx).await?)
    }

    /// Run the loop until the model answers, a limit is hit, or the run is
    /// cancelled.
    pub async fn run(&mut self, input: &str, options: RunOptions) -> Result<RunOutput, AgentError> {
        if self.initialized {
            self.memory.add(Message::user(input));
        } else {
            self.init(input)?;
        }

        let run_id = Uuid::new_v4().to_string();
        let signal = options.signal.clone().unwrap_or_default();
        let config = options.execution;

        info!(%run_id, max_iterations = config.max_iterations, "starting agent run");
        self.emitter.emit(RunEvent::Start {
            run_id: run_id.clone(),
        });

        let mut budget = RetryBudget::new(config.max_retries_per_step, config.total_max_retries);
        let mut iterations = 0u32;

        for iteration in 1..=config.max_iterations {
            if signal.is_cancelled() {
                return Ok(self.cancelled(run_id, iterations, &signal));
            }
            let meta = IterationMeta { iteration };

            // Reason: ask the model for the next action.
            let mut unit_retries = 0u32;
            let decision = loop {
                match self.step(meta).await {
                    Ok(decision) => break decision,
                    Err(error) => {
                        if is_recoverable(&error) && budget.allow_retry(&mut unit_retries) {
                            warn!(%error, iteration, "model step failed, retrying");
                            self.emitter.emit(RunEvent::Retry {
                                error: error.to_string(),
                                meta,
                            });
                            continue;
                        }
                        return Err(self.fail(error, unit_retries));
                    }
                }
            };

            let call = match decision {
                IterationResult::FinalAnswer { text } => {
                    self.memory.add(Message::assistant(text.clone()));
                    self.emitter.emit(RunEvent::Update {
                        key: "final_answer".to_string(),
                        value: json!(text),
                        meta,
                    });
                    self.emitter.emit(RunEvent::Success { value: json!(text) });
                    iterations += 1;
                    info!(%run_id, iterations, "agent run completed");
                    return Ok(RunOutput {
                        run_id,
                        outcome: RunOutcome::Completed { answer: text },
                        iterations,
                    });
                }
                IterationResult::ToolInvocation(call) => call,
            };

            let call_record = json!({
                "tool_name": call.tool_name,
                "tool_input": call.tool_input,
            });
            self.memory.add(Message::assistant(call_record.to_string()));
            self.emitter.emit(RunEvent::Update {
                key: "tool_call".to_string(),
                value: call_record,
                meta,
            });

            // Act: execute the requested tool.
            let mut unit_retries = 0u32;
            let observation = loop {
                match self.tool(&call, &signal, &run_id).await {
                    Ok(result) => break result,
                    Err(AgentError::Tool(ToolError::Cancelled)) => {
                        return Ok(self.cancelled(run_id, iterations, &signal));
                    }
                    Err(error) => {
                        if is_recoverable(&error) && budget.allow_retry(&mut unit_retries) {
                            warn!(%error, iteration, tool = %call.tool_name, "tool call failed, retrying");
                            self.emitter.emit(RunEvent::Retry {
                                error: error.to_string(),
                                meta,
                            });
                            continue;
                        }
                        return Err(self.fail(error, unit_retries));
                    }
                }
            };

            self.memory.add(Message::tool(observation.content.clone()));
            self.emitter.emit(RunEvent::Update {
                key: "observation".to_string(),
                value: json!(observation.content),
                meta,
            });
            iterations += 1;
        }

        let error = AgentError::IterationLimit(config.max_iterations);
        self.emitter.emit(RunEvent::Error {
            error: error.to_string(),
        });
        Err(error)
    }

    fn cancelled(&self, run_id: String, iterations: u32, signal: &CancellationToken) -> RunOutput {
        let reason = signal.reason().map(str::to_string);
        info!(%run_id, iterations, "agent run cancelled");
        self.emitter.emit(RunEvent::Cancelled {
            reason: reason.clone(),
        });
        RunOutput {
            run_id,
            outcome: RunOutcome::Cancelled { reason },
            iterations,
        }
    }

    /// Wrap a recoverable error whose retry budget ran out; pass final
    /// errors through unchanged. Emits the error event either way.
    fn fail(&self, error: AgentError, unit_retries: u32) -> AgentError {
        let error = if is_recoverable(&error) {
            AgentError::RetriesExhausted {
                attempts: unit_retries + 1,
                cause: Box::new(error),
            }
        } else {
            error
        };
        self.emitter.emit(RunEvent::Error {
            error: error.to_string(),
        });
        error
    }
}

/// Build the default system prompt from the registered tool definitions.
fn default_system_prompt(definitions: &[ToolDefinition]) -> String {
    let mut prompt = String::from(
        "You are a helpful assistant that solves tasks step by step.\n\nAvailable tools:\n",
    );
    for def in definitions {
        prompt.push_str(&format!("- {}: {}\n", def.name, def.description));
    }
    prompt.push_str(
        "\nRespond with a single JSON object. To call a tool, reply \
         {\"tool_name\": \"<name>\", \"tool_input\": {...}}. To finish, reply \
         {\"final_answer\": \"<answer>\"}.",
    );
    prompt
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
