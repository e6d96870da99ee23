//! Tests for the reason-act runner.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use stepflow_core::emitter::Emitter;
use stepflow_core::events::{EventFilter, EventKind, IterationMeta, RunEvent};
use stepflow_core::registry::{ProviderRegistry, ToolRegistry};
use stepflow_protocols::cancellation::CancellationToken;
use stepflow_protocols::error::{AgentError, ProviderError, RegistryError, ToolError};
use stepflow_protocols::provider::{ChatProvider, ChatRequest, ChatResponse};
use stepflow_protocols::tool::{Tool, ToolContext, ToolDefinition, ToolResult};
use stepflow_protocols::types::MessageRole;

use super::{ReactRunner, RunOutcome};
use crate::config::{ExecutionConfig, RunOptions};

const WEATHER_CALL: &str = r#"{"tool_name": "weather", "tool_input": {"location": "Paris"}}"#;
const MISSING_CALL: &str = r#"{"tool_name": "missing", "tool_input": {}}"#;
const FINAL: &str = r#"{"final_answer": "It is sunny in Paris."}"#;

/// Provider that replays a fixed script of replies.
struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    calls: AtomicU32,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().pop_front() {
            Some(text) => Ok(ChatResponse::new(text)),
            None => Err(ProviderError::InvalidResponse("script exhausted".to_string())),
        }
    }
}

/// Provider that fails a number of times before following its script.
struct FlakyProvider {
    fail_times: u32,
    calls: AtomicU32,
    reply: String,
}

impl FlakyProvider {
    fn new(fail_times: u32, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_times,
            calls: AtomicU32::new(0),
            reply: reply.to_string(),
        })
    }
}

#[async_trait]
impl ChatProvider for FlakyProvider {
    fn id(&self) -> &str {
        "flaky"
    }

    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst);
        if count < self.fail_times {
            Err(ProviderError::Network("connection reset".to_string()))
        } else {
            Ok(ChatResponse::new(self.reply.clone()))
        }
    }
}

/// Tool that counts invocations and fails the first `fail_times` of them.
struct CountingTool {
    definition: ToolDefinition,
    calls: AtomicU32,
    fail_times: u32,
}

impl CountingTool {
    fn new(fail_times: u32) -> Arc<Self> {
        Arc::new(Self {
            definition: ToolDefinition::new("weather", "Look up the weather"),
            calls: AtomicU32::new(0),
            fail_times,
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _input: Value, _ctx: ToolContext) -> Result<ToolResult, ToolError> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst);
        if count < self.fail_times {
            Err(ToolError::ExecutionFailed("service unavailable".to_string()))
        } else {
            Ok(ToolResult::success("sunny, 22C"))
        }
    }
}

/// Tool that cancels its own run while executing.
struct CancellingTool {
    definition: ToolDefinition,
}

impl CancellingTool {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            definition: ToolDefinition::new("weather", "Look up the weather"),
        })
    }
}

#[async_trait]
impl Tool for CancellingTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _input: Value, ctx: ToolContext) -> Result<ToolResult, ToolError> {
        ctx.signal.cancel("tool requested stop");
        Ok(ToolResult::success("partial result"))
    }
}

fn runner_with(provider: Arc<dyn ChatProvider>, tool: Option<Arc<dyn Tool>>) -> ReactRunner {
    let registry = Arc::new(ToolRegistry::new());
    if let Some(tool) = tool {
        registry.register(tool).unwrap();
    }
    ReactRunner::new(provider, registry)
}

fn event_tags(emitter: &Emitter) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    emitter.on(EventFilter::All, move |event| {
        let tag = match &event.payload {
            RunEvent::Update { key, .. } => format!("update:{key}"),
            other => format!("{:?}", other.kind()),
        };
        sink.lock().push(tag);
    });
    seen
}

#[tokio::test]
async fn test_immediate_final_answer() {
    let provider = ScriptedProvider::new(&[FINAL]);
    let mut runner = runner_with(provider.clone(), None);

    let output = runner.run("weather in Paris?", RunOptions::new()).await.unwrap();

    assert_eq!(output.outcome, RunOutcome::Completed {
        answer: "It is sunny in Paris.".to_string()
    });
    assert_eq!(output.iterations, 1);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_tool_call_then_final_answer() {
    let provider = ScriptedProvider::new(&[WEATHER_CALL, FINAL]);
    let tool = CountingTool::new(0);
    let mut runner = runner_with(provider.clone(), Some(tool.clone()));

    let output = runner.run("weather in Paris?", RunOptions::new()).await.unwrap();

    assert_eq!(output.outcome.answer(), Some("It is sunny in Paris."));
    assert_eq!(output.iterations, 2);
    assert_eq!(tool.calls(), 1);

    // The observation was fed back into the conversation.
    let roles: Vec<MessageRole> = runner.history().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::Tool,
            MessageRole::Assistant,
        ]
    );
    assert_eq!(runner.history()[3].content, "sunny, 22C");
}

#[tokio::test]
async fn test_iteration_limit_fails_run() {
    let provider = ScriptedProvider::new(&[WEATHER_CALL, WEATHER_CALL, WEATHER_CALL]);
    let tool = CountingTool::new(0);
    let mut runner = runner_with(provider, Some(tool.clone()));

    let options = RunOptions::new()
        .with_execution(ExecutionConfig::new().with_max_iterations(3));
    let result = runner.run("weather in Paris?", options).await;

    assert!(matches!(result, Err(AgentError::IterationLimit(3))));
    assert_eq!(tool.calls(), 3);
}

#[tokio::test]
async fn test_failed_tool_call_is_reexecuted_per_retry() {
    let provider = ScriptedProvider::new(&[WEATHER_CALL]);
    let tool = CountingTool::new(u32::MAX);
    let mut runner = runner_with(provider, Some(tool.clone()));

    let options = RunOptions::new().with_execution(
        ExecutionConfig::new().with_max_retries_per_step(2).with_total_max_retries(10),
    );
    let result = runner.run("weather in Paris?", options).await;

    // Initial call plus exactly two retries.
    assert_eq!(tool.calls(), 3);
    match result {
        Err(AgentError::RetriesExhausted { attempts, cause }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*cause, AgentError::Tool(ToolError::ExecutionFailed(_))));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_total_retry_budget_spans_the_run() {
    let provider = ScriptedProvider::new(&[WEATHER_CALL]);
    let tool = CountingTool::new(u32::MAX);
    let mut runner = runner_with(provider, Some(tool.clone()));

    // Per-unit headroom remains, but the run-wide budget allows one retry.
    let options = RunOptions::new().with_execution(
        ExecutionConfig::new().with_max_retries_per_step(3).with_total_max_retries(1),
    );
    let result = runner.run("weather in Paris?", options).await;

    assert_eq!(tool.calls(), 2);
    assert!(matches!(
        result,
        Err(AgentError::RetriesExhausted { attempts: 2, .. })
    ));
}

#[tokio::test]
async fn test_tool_failure_recovers_within_budget() {
    let provider = ScriptedProvider::new(&[WEATHER_CALL, FINAL]);
    let tool = CountingTool::new(2);
    let mut runner = runner_with(provider, Some(tool.clone()));

    let output = runner.run("weather in Paris?", RunOptions::new()).await.unwrap();

    assert_eq!(tool.calls(), 3);
    assert_eq!(output.outcome.answer(), Some("It is sunny in Paris."));
}

#[tokio::test]
async fn test_unparseable_reply_is_retried_with_a_fresh_query() {
    let provider = ScriptedProvider::new(&["I am thinking about it.", FINAL]);
    let mut runner = runner_with(provider.clone(), None);

    let tags = event_tags(runner.emitter());
    let output = runner.run("weather in Paris?", RunOptions::new()).await.unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(output.iterations, 1);
    assert!(tags.lock().iter().any(|t| t == "Retry"));
}

#[tokio::test]
async fn test_always_unparseable_model_exhausts_per_step_budget() {
    let provider = ScriptedProvider::new(&["no action here", "still no action"]);
    let mut runner = runner_with(provider.clone(), None);

    let options = RunOptions::new().with_execution(
        ExecutionConfig::new()
            .with_max_iterations(3)
            .with_max_retries_per_step(1)
            .with_total_max_retries(5),
    );
    let result = runner.run("weather in Paris?", options).await;

    // One attempt plus one retry, all within the first iteration.
    assert_eq!(provider.calls(), 2);
    match result {
        Err(AgentError::RetriesExhausted { attempts, cause }) => {
            assert_eq!(attempts, 2);
            assert!(matches!(*cause, AgentError::Parse(_)));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_provider_failure_is_retried() {
    let provider = FlakyProvider::new(1, FINAL);
    let mut runner = runner_with(provider, None);

    let output = runner.run("weather in Paris?", RunOptions::new()).await.unwrap();
    assert_eq!(output.outcome.answer(), Some("It is sunny in Paris."));
}

#[tokio::test]
async fn test_unknown_tool_exhausts_retries() {
    let provider = ScriptedProvider::new(&[MISSING_CALL, MISSING_CALL]);
    let mut runner = runner_with(provider, None);

    let options = RunOptions::new().with_execution(
        ExecutionConfig::new().with_max_retries_per_step(1).with_total_max_retries(1),
    );
    let result = runner.run("weather in Paris?", options).await;

    match result {
        Err(AgentError::RetriesExhausted { cause, .. }) => {
            assert!(matches!(*cause, AgentError::Tool(ToolError::NotFound(_))));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancel_before_run_skips_the_model() {
    let provider = ScriptedProvider::new(&[FINAL]);
    let mut runner = runner_with(provider.clone(), None);

    let signal = CancellationToken::new();
    signal.cancel("never mind");
    let options = RunOptions::new().with_signal(signal);

    let output = runner.run("weather in Paris?", options).await.unwrap();

    assert_eq!(provider.calls(), 0);
    assert_eq!(output.iterations, 0);
    assert_eq!(
        output.outcome,
        RunOutcome::Cancelled {
            reason: Some("never mind".to_string())
        }
    );
}

#[tokio::test]
async fn test_cancel_during_tool_stops_after_the_iteration() {
    let provider = ScriptedProvider::new(&[WEATHER_CALL, FINAL]);
    let tool = CancellingTool::new();
    let mut runner = runner_with(provider.clone(), Some(tool));

    let signal = CancellationToken::new();
    let options = RunOptions::new().with_signal(signal);
    let output = runner.run("weather in Paris?", options).await.unwrap();

    // The in-flight iteration finished, then the run wound down.
    assert_eq!(output.iterations, 1);
    assert!(output.outcome.is_cancelled());
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_runner_built_from_provider_registry() {
    let providers = ProviderRegistry::new();
    providers.register(ScriptedProvider::new(&[FINAL])).unwrap();
    let tools = Arc::new(ToolRegistry::new());

    let mut runner = ReactRunner::from_registry(&providers, "scripted", tools).unwrap();
    let output = runner.run("weather in Paris?", RunOptions::new()).await.unwrap();
    assert_eq!(output.outcome.answer(), Some("It is sunny in Paris."));
}

#[tokio::test]
async fn test_unknown_provider_id_is_rejected() {
    let providers = ProviderRegistry::new();
    let tools = Arc::new(ToolRegistry::new());

    let result = ReactRunner::from_registry(&providers, "missing", tools);
    assert!(matches!(result, Err(RegistryError::NotFound(id)) if id == "missing"));
}

#[tokio::test]
async fn test_step_before_init_is_rejected() {
    let provider = ScriptedProvider::new(&[FINAL]);
    let runner = runner_with(provider.clone(), None);

    let result = runner.step(IterationMeta { iteration: 1 }).await;
    assert!(matches!(result, Err(AgentError::NotInitialized)));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_emitter_subscribers_persist_across_runs() {
    let provider = ScriptedProvider::new(&[FINAL, FINAL]);
    let mut runner = runner_with(provider, None);

    let tags = event_tags(runner.emitter());
    runner.run("first question", RunOptions::new()).await.unwrap();
    runner.run("second question", RunOptions::new()).await.unwrap();

    let starts = tags.lock().iter().filter(|t| *t == "Start").count();
    assert_eq!(starts, 2);
}

#[tokio::test]
async fn test_init_twice_is_rejected() {
    let provider = ScriptedProvider::new(&[]);
    let mut runner = runner_with(provider, None);

    runner.init("first").unwrap();
    let result = runner.init("second");
    assert!(matches!(result, Err(AgentError::AlreadyInitialized)));
}

#[tokio::test]
async fn test_run_seeds_system_and_user_messages() {
    let provider = ScriptedProvider::new(&[FINAL]);
    let tool = CountingTool::new(0);
    let mut runner = runner_with(provider, Some(tool));

    runner.run("weather in Paris?", RunOptions::new()).await.unwrap();

    let history = runner.history();
    assert_eq!(history[0].role, MessageRole::System);
    assert!(history[0].content.contains("weather"));
    assert_eq!(history[1].role, MessageRole::User);
    assert_eq!(history[1].content, "weather in Paris?");
}

#[tokio::test]
async fn test_second_run_appends_a_user_turn() {
    let provider = ScriptedProvider::new(&[FINAL, FINAL]);
    let mut runner = runner_with(provider, None);

    runner.run("first question", RunOptions::new()).await.unwrap();
    runner.run("second question", RunOptions::new()).await.unwrap();

    let user_turns: Vec<&str> = runner
        .history()
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(user_turns, vec!["first question", "second question"]);
}

#[tokio::test]
async fn test_event_sequence_for_tool_run() {
    let provider = ScriptedProvider::new(&[WEATHER_CALL, FINAL]);
    let tool = CountingTool::new(0);
    let mut runner = runner_with(provider, Some(tool.clone()));

    let tags = event_tags(runner.emitter());
    runner.run("weather in Paris?", RunOptions::new()).await.unwrap();

    assert_eq!(
        *tags.lock(),
        vec![
            "Start".to_string(),
            "update:tool_call".to_string(),
            "update:observation".to_string(),
            "update:final_answer".to_string(),
            "Success".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_error_event_emitted_on_failure() {
    let provider = ScriptedProvider::new(&[WEATHER_CALL]);
    let tool = CountingTool::new(u32::MAX);
    let mut runner = runner_with(provider, Some(tool));

    let tags = event_tags(runner.emitter());
    let options = RunOptions::new().with_execution(
        ExecutionConfig::new().with_max_retries_per_step(0).with_total_max_retries(0),
    );
    let _ = runner.run("weather in Paris?", options).await;

    assert_eq!(tags.lock().last().map(String::as_str), Some("Error"));
}

#[test]
fn test_event_kind_debug_tags_are_stable() {
    // event_tags relies on the Debug names of non-update kinds.
    assert_eq!(format!("{:?}", EventKind::Start), "Start");
    assert_eq!(format!("{:?}", EventKind::Retry), "Retry");
}
