//! Orchestrator use case.
//!
//! Ties the turn stages together and owns per-conversation state.
//!
//! ```text
//! user text ─▶ Routing ─┬─ Tool ─▶ Extracting ─▶ Validating ─▶ Executing ─▶ Finalizing ─┐
//!                       │                                                             ├─▶ Responded
//!                       ├─ None ─▶ Generating ────────────────────────────────────────┘
//!                       └─ backend failure ─▶ Aborted (ModelUnavailable)
//! ```
//!
//! Calls for the same conversation id are serialised by a per-id async
//! mutex held for the whole turn, including the streaming tail. Different
//! ids run in parallel; the registry is the only state they share.

use crate::config::OrchestratorConfig;
use crate::ports::completion_backend::{CompletionBackend, GatewayError, StreamHandle};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, EventKind, NoConversationLogger,
};
use crate::ports::conversation_store::{ConversationStore, NoConversationStore};
use crate::ports::turn_progress::{NoTurnProgress, TurnProgressNotifier, TurnStage};
use crate::use_cases::execute_tool::ToolExecutor;
use crate::use_cases::extract_arguments::ArgumentExtractor;
use crate::use_cases::fallback::FallbackGenerator;
use crate::use_cases::route_turn::Router;
use futures::Stream;
use parley_domain::{
    ConversationContext, DefaultSchemaValidator, ExecutionError, ExecutionErrorKind,
    RouterDecision, SchemaValidator, StreamEvent, ToolRegistry, Turn, TurnError, ValidationError,
    single_line_preview,
};
use serde_json::json;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Errors that abort a turn.
///
/// Only routing can abort; every later failure becomes an assistant turn
/// with an error marker.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] GatewayError),

    #[error("Turn task failed: {0}")]
    TaskFailed(String),
}

/// `None` until the context has been seeded from the store
type Slot = Arc<Mutex<Option<ConversationContext>>>;

/// Work left after the eager stages of a turn
enum Pending {
    Done(Turn),
    Finalize {
        tool: String,
        raw_output: String,
        utterance: String,
    },
    Fallback,
}

/// Which generation a stream belongs to, for error reporting
#[derive(Clone)]
enum Generation {
    Finalize(String),
    Conversation,
}

impl Generation {
    fn failure(&self, reason: &str) -> (String, TurnError) {
        match self {
            Generation::Finalize(tool) => {
                let err = ExecutionError::new(
                    tool.as_str(),
                    ExecutionErrorKind::FinalizeFailed,
                    reason,
                );
                (execution_message(&err), TurnError::Execution(err.to_string()))
            }
            Generation::Conversation => (
                generation_message(reason),
                TurnError::Generation(reason.to_string()),
            ),
        }
    }
}

enum StreamSource {
    Ready(Turn),
    Live {
        handle: StreamHandle,
        generation: Generation,
    },
}

/// Side effects of completing a turn: store, JSONL log, progress
#[derive(Clone)]
struct TurnRecorder {
    store: Arc<dyn ConversationStore>,
    conversation_logger: Arc<dyn ConversationLogger>,
    progress: Arc<dyn TurnProgressNotifier>,
}

impl TurnRecorder {
    async fn append(&self, id: &str, ctx: &mut ConversationContext, turn: Turn) {
        if let Err(e) = self.store.append(id, &turn).await {
            warn!("Failed to persist turn for conversation '{}': {}", id, e);
        }
        ctx.push(turn);
    }

    async fn finish(&self, id: &str, ctx: &mut ConversationContext, turn: Turn) {
        self.conversation_logger.log(ConversationEvent::new(
            EventKind::TurnCompleted,
            json!({
                "conversation_id": id,
                "error": turn.error.as_ref().map(|e| e.to_string()),
                "content": single_line_preview(&turn.content, 200),
            }),
        ));
        self.progress.on_turn_complete(id, !turn.is_error());
        self.append(id, ctx, turn).await;
    }
}

/// The tool-routing turn engine.
pub struct Orchestrator {
    registry: Arc<ToolRegistry>,
    validator: Arc<dyn SchemaValidator>,
    router: Router,
    extractor: ArgumentExtractor,
    executor: ToolExecutor,
    fallback: FallbackGenerator,
    recorder: TurnRecorder,
    history_window: usize,
    stream_idle_timeout: Option<Duration>,
    conversations: Mutex<HashMap<String, Slot>>,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        registry: Arc<ToolRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        let timeout = config.request_timeout;
        Self {
            router: Router::new(
                backend.clone(),
                registry.clone(),
                config.options.router,
                timeout,
            ),
            extractor: ArgumentExtractor::new(
                backend.clone(),
                registry.clone(),
                config.bulk,
                config.options.extraction,
                timeout,
            ),
            executor: ToolExecutor::new(
                backend.clone(),
                config.options.finalize,
                timeout,
                config.language,
            ),
            fallback: FallbackGenerator::new(
                backend,
                config.options.fallback,
                timeout,
                config.preamble,
                config.history_window,
            ),
            registry,
            validator: Arc::new(DefaultSchemaValidator),
            recorder: TurnRecorder {
                store: Arc::new(NoConversationStore),
                conversation_logger: Arc::new(NoConversationLogger),
                progress: Arc::new(NoTurnProgress),
            },
            history_window: config.history_window,
            stream_idle_timeout: config.stream_idle_timeout,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.recorder.store = store;
        self
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.recorder.conversation_logger = logger;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn TurnProgressNotifier>) -> Self {
        self.recorder.progress = progress;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    // ==================== Public Operations ====================

    /// Process one user utterance and return the assistant turn.
    pub async fn process(&self, id: &str, text: &str) -> Result<Turn, OrchestratorError> {
        let slot = self.slot(id).await;
        let mut guard = slot.lock().await;
        let ctx = self.context_for(id, &mut guard).await;

        let turn = match self.begin_turn(id, ctx, text).await? {
            Pending::Done(turn) => turn,
            Pending::Finalize {
                tool,
                raw_output,
                utterance,
            } => {
                self.stage(id, TurnStage::Finalizing);
                match self
                    .executor
                    .finalize(&tool, &raw_output, &utterance)
                    .await
                {
                    Ok(reply) => Turn::assistant(reply),
                    Err(e) => {
                        warn!("{}", e);
                        Turn::failed(execution_message(&e), TurnError::Execution(e.to_string()))
                    }
                }
            }
            Pending::Fallback => {
                self.stage(id, TurnStage::Generating);
                match self.fallback.generate(ctx).await {
                    Ok(reply) => Turn::assistant(reply),
                    Err(e) => {
                        warn!("Conversational generation failed: {}", e);
                        let reason = e.to_string();
                        Turn::failed(generation_message(&reason), TurnError::Generation(reason))
                    }
                }
            }
        };

        self.recorder.finish(id, ctx, turn.clone()).await;
        Ok(turn)
    }

    /// Process one user utterance and stream the reply.
    ///
    /// Routing and the tool stages run before this returns, so a routing
    /// failure is reported here. The final generation is streamed; the
    /// concatenated fragments equal what [`process`](Self::process) would
    /// return.
    pub async fn process_stream(
        &self,
        id: &str,
        text: &str,
    ) -> Result<TurnStream, OrchestratorError> {
        let slot = self.slot(id).await;
        let mut guard = slot.lock_owned().await;

        let source = {
            let ctx = self.context_for(id, &mut guard).await;
            match self.begin_turn(id, ctx, text).await? {
                Pending::Done(turn) => StreamSource::Ready(turn),
                Pending::Finalize {
                    tool,
                    raw_output,
                    utterance,
                } => {
                    self.stage(id, TurnStage::Finalizing);
                    match self
                        .executor
                        .finalize_streaming(&tool, &raw_output, &utterance)
                        .await
                    {
                        Ok(handle) => StreamSource::Live {
                            handle,
                            generation: Generation::Finalize(tool),
                        },
                        Err(e) => {
                            warn!("{}", e);
                            StreamSource::Ready(Turn::failed(
                                execution_message(&e),
                                TurnError::Execution(e.to_string()),
                            ))
                        }
                    }
                }
                Pending::Fallback => {
                    self.stage(id, TurnStage::Generating);
                    match self.fallback.generate_streaming(ctx).await {
                        Ok(handle) => StreamSource::Live {
                            handle,
                            generation: Generation::Conversation,
                        },
                        Err(e) => {
                            warn!("Conversational generation failed: {}", e);
                            let reason = e.to_string();
                            StreamSource::Ready(Turn::failed(
                                generation_message(&reason),
                                TurnError::Generation(reason),
                            ))
                        }
                    }
                }
            }
        };

        let (tx, rx) = mpsc::channel(32);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(forward_turn(
            id.to_string(),
            guard,
            source,
            tx,
            cancel.clone(),
            self.stream_idle_timeout,
            self.recorder.clone(),
        ));

        Ok(TurnStream {
            receiver: rx,
            cancel,
            task: Some(task),
        })
    }

    /// Clear the in-memory context for `id`. Persisted turns are kept and
    /// are not reloaded for this id.
    pub async fn reset(&self, id: &str) {
        let slot = self.slot(id).await;
        *slot.lock().await = Some(ConversationContext::new());
        info!("Conversation '{}' reset", id);
    }

    /// Drop the in-memory context for `id` so the orchestrator stops holding
    /// it. A later turn for the same id reseeds from the store. Returns
    /// `false`, leaving the context in place, while a turn or stream for `id`
    /// is still running.
    pub async fn release(&self, id: &str) -> bool {
        let mut conversations = self.conversations.lock().await;
        let idle = match conversations.get(id) {
            Some(slot) => Arc::strong_count(slot) == 1,
            None => return true,
        };
        if idle {
            conversations.remove(id);
            debug!("Conversation '{}' released", id);
        }
        idle
    }

    /// Number of conversations currently held in memory
    pub async fn active_conversations(&self) -> usize {
        self.conversations.lock().await.len()
    }

    /// Snapshot of the turns held for `id`
    pub async fn history(&self, id: &str) -> Vec<Turn> {
        let slot = self.slot(id).await;
        let mut guard = slot.lock().await;
        self.context_for(id, &mut guard).await.turns().to_vec()
    }

    // ==================== Turn Stages ====================

    async fn slot(&self, id: &str) -> Slot {
        self.conversations
            .lock()
            .await
            .entry(id.to_string())
            .or_default()
            .clone()
    }

    async fn context_for<'a>(
        &self,
        id: &str,
        slot: &'a mut Option<ConversationContext>,
    ) -> &'a mut ConversationContext {
        let ctx = match slot.take() {
            Some(ctx) => ctx,
            None => match self.recorder.store.load(id).await {
                Ok(turns) => {
                    debug!("Seeded conversation '{}' with {} turn(s)", id, turns.len());
                    ConversationContext::from_turns(turns)
                }
                Err(e) => {
                    warn!("Failed to load conversation '{}': {}", id, e);
                    ConversationContext::new()
                }
            },
        };
        slot.insert(ctx)
    }

    fn stage(&self, id: &str, stage: TurnStage) {
        debug!("Conversation '{}': {}", id, stage);
        self.recorder.progress.on_stage(id, stage);
    }

    /// Append the user turn, route, and run the tool stages.
    async fn begin_turn(
        &self,
        id: &str,
        ctx: &mut ConversationContext,
        text: &str,
    ) -> Result<Pending, OrchestratorError> {
        info!("Turn for '{}': {}", id, single_line_preview(text, 100));
        self.recorder.append(id, ctx, Turn::user(text)).await;

        self.stage(id, TurnStage::Routing);
        let decision = match self.router.route(ctx.window(self.history_window)).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Routing failed for '{}', turn aborted: {}", id, e);
                self.recorder.conversation_logger.log(ConversationEvent::new(
                    EventKind::TurnAborted,
                    json!({ "conversation_id": id, "reason": e.to_string() }),
                ));
                return Err(OrchestratorError::ModelUnavailable(e));
            }
        };

        self.recorder.conversation_logger.log(ConversationEvent::new(
            EventKind::RouteDecision,
            json!({ "conversation_id": id, "tool": decision.tool_name() }),
        ));
        self.recorder.progress.on_route(id, &decision);

        match decision {
            RouterDecision::None => Ok(Pending::Fallback),
            RouterDecision::Tool(name) => Ok(self.run_tool_stages(id, ctx, &name, text).await),
        }
    }

    async fn run_tool_stages(
        &self,
        id: &str,
        ctx: &ConversationContext,
        name: &str,
        utterance: &str,
    ) -> Pending {
        let spec = match self.registry.get(name) {
            Ok(spec) => spec,
            Err(e) => {
                error!("Router chose a tool missing from the registry (bug): {}", e);
                return Pending::Done(Turn::failed(
                    "Sorry, something went wrong while running a tool.",
                    TurnError::ToolNotFound(name.to_string()),
                ));
            }
        };

        self.stage(id, TurnStage::Extracting);
        let (raw, source) = self
            .extractor
            .extract(spec, ctx.window(self.history_window))
            .await;

        self.stage(id, TurnStage::Validating);
        let args = match self.validator.validate(spec.definition(), &raw) {
            Ok(args) => args,
            Err(e) => {
                warn!("{}", e);
                self.recorder.conversation_logger.log(ConversationEvent::new(
                    EventKind::ValidationFailed,
                    json!({
                        "conversation_id": id,
                        "tool": spec.name(),
                        "field": e.field(),
                        "error": e.to_string(),
                    }),
                ));
                return Pending::Done(Turn::failed(
                    validation_message(spec.name(), &e),
                    TurnError::Validation(e.to_string()),
                ));
            }
        };

        self.stage(id, TurnStage::Executing);
        self.recorder.conversation_logger.log(ConversationEvent::new(
            EventKind::ToolCall,
            json!({
                "conversation_id": id,
                "tool": spec.name(),
                "source": source.as_str(),
                "arguments": &args,
            }),
        ));

        let result = self.executor.execute(spec, &args).await;
        self.recorder.conversation_logger.log(ConversationEvent::new(
            EventKind::ToolResult,
            json!({
                "conversation_id": id,
                "tool": spec.name(),
                "success": result.is_ok(),
                "output": match &result {
                    Ok(output) => single_line_preview(output, 200),
                    Err(e) => e.to_string(),
                },
            }),
        ));

        match result {
            Ok(raw_output) => Pending::Finalize {
                tool: spec.name().to_string(),
                raw_output,
                utterance: utterance.to_string(),
            },
            Err(e) => Pending::Done(Turn::failed(
                execution_message(&e),
                TurnError::Execution(e.to_string()),
            )),
        }
    }
}

// ==================== Streaming ====================

/// Forward a generation to the caller, then record the assistant turn.
///
/// Owns the conversation guard, so the id stays locked until the turn is
/// appended.
async fn forward_turn(
    id: String,
    mut guard: OwnedMutexGuard<Option<ConversationContext>>,
    source: StreamSource,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
    idle_timeout: Option<Duration>,
    recorder: TurnRecorder,
) -> Turn {
    let turn = match source {
        StreamSource::Ready(turn) => {
            if !turn.content.is_empty() {
                let _ = tx.send(turn.content.clone()).await;
            }
            turn
        }
        StreamSource::Live { handle, generation } => {
            relay(handle, &tx, &cancel, idle_timeout, generation).await
        }
    };
    drop(tx);

    let ctx = guard.get_or_insert_with(ConversationContext::new);
    recorder.finish(&id, ctx, turn.clone()).await;
    turn
}

enum RelayOutcome {
    Finished,
    Cancelled,
    Failed(String),
}

async fn relay(
    mut handle: StreamHandle,
    tx: &mpsc::Sender<String>,
    cancel: &CancellationToken,
    idle_timeout: Option<Duration>,
    generation: Generation,
) -> Turn {
    let mut content = String::new();

    let outcome = loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            event = next_event(&mut handle, idle_timeout) => Some(event),
        };
        let Some(event) = event else {
            break RelayOutcome::Cancelled;
        };

        match event {
            Ok(Some(StreamEvent::Delta(chunk))) => {
                if chunk.is_empty() {
                    continue;
                }
                content.push_str(&chunk);
                if tx.send(chunk).await.is_err() {
                    break RelayOutcome::Cancelled;
                }
            }
            Ok(Some(StreamEvent::Completed(text))) => {
                // Backends without deltas deliver the whole text here
                if content.is_empty() && !text.is_empty() {
                    content = text.clone();
                    if tx.send(text).await.is_err() {
                        break RelayOutcome::Cancelled;
                    }
                }
                break RelayOutcome::Finished;
            }
            Ok(Some(StreamEvent::Error(e))) => break RelayOutcome::Failed(e),
            Ok(None) => break RelayOutcome::Finished,
            Err(e) => break RelayOutcome::Failed(e.to_string()),
        }
    };

    match outcome {
        RelayOutcome::Finished => Turn::assistant(content),
        RelayOutcome::Cancelled => {
            handle.cancel();
            info!("Stream cancelled after {} byte(s)", content.len());
            Turn::failed(content, TurnError::Cancelled)
        }
        RelayOutcome::Failed(reason) => {
            handle.cancel();
            warn!("Stream failed: {}", reason);
            let (message, marker) = generation.failure(&reason);
            let notice = if content.is_empty() {
                message
            } else {
                format!("\n\n{}", message)
            };
            let _ = tx.send(notice.clone()).await;
            content.push_str(&notice);
            Turn::failed(content, marker)
        }
    }
}

async fn next_event(
    handle: &mut StreamHandle,
    idle_timeout: Option<Duration>,
) -> Result<Option<StreamEvent>, GatewayError> {
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, handle.receiver.recv())
            .await
            .map_err(|_| GatewayError::Timeout),
        None => Ok(handle.receiver.recv().await),
    }
}

/// Lazy, finite, non-restartable sequence of reply fragments.
///
/// Dropping the stream or calling [`cancel`](Self::cancel) stops the turn;
/// the fragments produced so far are kept as an assistant turn marked
/// [`TurnError::Cancelled`].
pub struct TurnStream {
    receiver: mpsc::Receiver<String>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Turn>>,
}

impl TurnStream {
    /// Next fragment, or `None` once the reply is complete
    pub async fn next_fragment(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drain remaining fragments and return the recorded assistant turn
    pub async fn finish(mut self) -> Result<Turn, OrchestratorError> {
        while self.receiver.recv().await.is_some() {}
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| OrchestratorError::TaskFailed(e.to_string())),
            None => Err(OrchestratorError::TaskFailed(
                "turn already finished".to_string(),
            )),
        }
    }
}

impl Stream for TurnStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for TurnStream {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.cancel.cancel();
        }
    }
}

// ==================== Messages ====================

fn validation_message(tool: &str, e: &ValidationError) -> String {
    match e {
        ValidationError::Missing { field, .. } => format!(
            "I couldn't run '{}': the required argument '{}' is missing.",
            tool, field
        ),
        ValidationError::TypeMismatch {
            field, expected, ..
        } => format!(
            "I couldn't run '{}': the argument '{}' must be {}.",
            tool, field, expected
        ),
    }
}

fn execution_message(e: &ExecutionError) -> String {
    match e.kind {
        ExecutionErrorKind::FinalizeFailed => format!(
            "The '{}' tool ran, but I couldn't phrase its result: {}",
            e.tool_name, e.message
        ),
        _ => format!("Sorry, '{}' failed: {}", e.tool_name, e.message),
    }
}

fn generation_message(reason: &str) -> String {
    format!("Sorry, I couldn't generate a reply: {}", reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::*;
    use futures::StreamExt;
    use parley_domain::{Role, ToolDefinition, ToolSpec};
    use std::sync::Mutex as StdMutex;

    fn orchestrator(backend: Arc<ScriptedBackend>, registry: Arc<ToolRegistry>) -> Orchestrator {
        Orchestrator::new(backend, registry, OrchestratorConfig::default())
    }

    fn math_registry() -> Arc<ToolRegistry> {
        registry(vec![add_tool()])
    }

    #[tokio::test]
    async fn test_add_round_trip() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("add"),
            text("{\"a\": 5, \"b\": 3}"),
            text("8"),
        ]));
        let orch = orchestrator(backend.clone(), math_registry());

        let turn = orch.process("c1", "Dodaj 5 i 3").await.unwrap();

        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content, "8");
        assert!(turn.error.is_none());
        assert_eq!(backend.calls(), 3);
        assert!(backend.prompts()[2].contains("returned:\n8\n"));

        let history = orch.history("c1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "Dodaj 5 i 3");
    }

    #[tokio::test]
    async fn test_validation_gate_blocks_capability() {
        let tool = CountingTool::ok("Dodano");
        let registry = registry(vec![ToolSpec::from_shared(add_task_definition(), tool.clone())]);
        let backend = Arc::new(ScriptedBackend::new(vec![text("add_task"), text("{}")]));
        let logger = Arc::new(RecordingLogger::default());
        let orch = orchestrator(backend.clone(), registry).with_conversation_logger(logger.clone());

        let turn = orch.process("c1", "dodaj zadanie").await.unwrap();

        match &turn.error {
            Some(TurnError::Validation(msg)) => assert!(msg.contains("'description'")),
            other => panic!("unexpected marker: {other:?}"),
        }
        assert!(turn.content.contains("description"));
        assert_eq!(tool.calls(), 0);
        // Router + extraction only; no finalize
        assert_eq!(backend.calls(), 2);
        assert!(logger.event_types().contains(&"validation_failed"));
        assert!(!logger.event_types().contains(&"tool_call"));
    }

    #[tokio::test]
    async fn test_bulk_shortcut_skips_extraction() {
        let list = CountingTool::ok("- [ID: 1] a\n- [ID: 2] b\n- [ID: 7] c");
        let received = Arc::new(StdMutex::new(Vec::new()));
        let sink = received.clone();
        let registry = registry(vec![
            ToolSpec::from_shared(ToolDefinition::new("list_tasks", "Lists tasks"), list.clone()),
            ToolSpec::from_sync_fn(task_ids_definition("delete_task"), move |args| {
                sink.lock().unwrap().extend(args.require_i64_list("task_ids")?);
                Ok("Usunięto 3 zadania".to_string())
            }),
        ]);
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("delete_task"),
            text("Usunięto wszystkie zadania."),
        ]));
        let orch = orchestrator(backend.clone(), registry);

        let turn = orch.process("c1", "Usuń wszystkie zadania").await.unwrap();

        assert_eq!(turn.content, "Usunięto wszystkie zadania.");
        assert_eq!(list.calls(), 1);
        assert_eq!(*received.lock().unwrap(), vec![1, 2, 7]);
        // Router + finalize; the extraction call was bypassed
        assert_eq!(backend.calls(), 2);
        assert!(!backend.prompts()[1].contains("Extract the arguments"));
    }

    #[tokio::test]
    async fn test_fallback_path() {
        let backend = Arc::new(ScriptedBackend::new(vec![text("none"), text("Cześć!")]));
        let logger = Arc::new(RecordingLogger::default());
        let orch = orchestrator(backend.clone(), math_registry())
            .with_conversation_logger(logger.clone());

        let turn = orch.process("c1", "Hej").await.unwrap();

        assert_eq!(turn.content, "Cześć!");
        assert_eq!(backend.calls(), 2);
        assert!(backend.prompts()[1].ends_with("user: Hej\nassistant:"));
        assert_eq!(logger.event_types(), vec!["route_decision", "turn_completed"]);
    }

    #[tokio::test]
    async fn test_router_failure_aborts() {
        let backend = Arc::new(ScriptedBackend::new(vec![Scripted::Fail(
            GatewayError::ConnectionError("refused".into()),
        )]));
        let store = Arc::new(RecordingStore::default());
        let orch = orchestrator(backend, math_registry()).with_store(store.clone());

        let err = orch.process("c1", "2+2?").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ModelUnavailable(_)));

        let history = orch.history("c1").await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(store.get("c1").len(), 1);
    }

    #[tokio::test]
    async fn test_tool_failure_becomes_error_turn() {
        let tool = CountingTool::failing(parley_domain::ToolError::not_found("task 9"));
        let registry = registry(vec![ToolSpec::from_shared(
            task_ids_definition("complete_task"),
            tool.clone(),
        )]);
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("complete_task"),
            text("{\"task_ids\": 9}"),
        ]));
        let orch = orchestrator(backend.clone(), registry);

        let turn = orch.process("c1", "zakończ zadanie 9").await.unwrap();
        assert!(matches!(turn.error, Some(TurnError::Execution(_))));
        assert!(turn.content.contains("task 9"));
        assert_eq!(tool.calls(), 1);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_finalize_failure_becomes_error_turn() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("add"),
            text("{\"a\": 1, \"b\": 1}"),
            Scripted::Fail(GatewayError::Timeout),
        ]));
        let orch = orchestrator(backend, math_registry());

        let turn = orch.process("c1", "1+1").await.unwrap();
        match turn.error {
            Some(TurnError::Execution(msg)) => assert!(msg.contains("finalize_failed")),
            other => panic!("unexpected marker: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_streaming_matches_process() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("none"),
            fragments(&["Hel", "lo"]),
            text("none"),
            fragments(&["Hel", "lo"]),
        ]));
        let orch = orchestrator(backend, math_registry());

        let stream = orch.process_stream("s1", "hi").await.unwrap();
        let parts: Vec<String> = stream.collect().await;
        assert_eq!(parts, vec!["Hel".to_string(), "lo".to_string()]);

        let turn = orch.process("s2", "hi").await.unwrap();
        assert_eq!(parts.concat(), turn.content);

        let history = orch.history("s1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "Hello");
        assert!(history[1].error.is_none());
    }

    #[tokio::test]
    async fn test_streaming_tool_path_streams_finalize() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("add"),
            text("{\"a\": 5, \"b\": 3}"),
            fragments(&["Wynik: ", "8"]),
        ]));
        let orch = orchestrator(backend, math_registry());

        let mut stream = orch.process_stream("c1", "5+3").await.unwrap();
        assert_eq!(stream.next_fragment().await.as_deref(), Some("Wynik: "));
        let turn = stream.finish().await.unwrap();
        assert_eq!(turn.content, "Wynik: 8");
    }

    #[tokio::test]
    async fn test_streaming_router_failure_is_immediate() {
        let backend = Arc::new(ScriptedBackend::new(vec![Scripted::Fail(GatewayError::Timeout)]));
        let orch = orchestrator(backend, math_registry());

        let result = orch.process_stream("c1", "hi").await;
        assert!(matches!(result, Err(OrchestratorError::ModelUnavailable(GatewayError::Timeout))));
        assert_eq!(orch.history("c1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_streaming_validation_error_is_last_fragment() {
        let registry = registry(vec![ToolSpec::from_shared(
            add_task_definition(),
            CountingTool::ok("ok"),
        )]);
        let backend = Arc::new(ScriptedBackend::new(vec![text("add_task"), text("nothing")]));
        let orch = orchestrator(backend, registry);

        let stream = orch.process_stream("c1", "dodaj").await.unwrap();
        let parts: Vec<String> = stream.collect().await;
        assert_eq!(parts.len(), 1);
        assert!(parts[0].contains("description"));

        let history = orch.history("c1").await;
        assert!(matches!(history[1].error, Some(TurnError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cancel_keeps_partial_reply() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("none"),
            Scripted::Hang(vec!["Hel".to_string()]),
        ]));
        let orch = orchestrator(backend.clone(), math_registry());

        let mut stream = orch.process_stream("c1", "hi").await.unwrap();
        assert_eq!(stream.next_fragment().await.as_deref(), Some("Hel"));
        stream.cancel();
        let turn = stream.finish().await.unwrap();

        assert_eq!(turn.content, "Hel");
        assert_eq!(turn.error, Some(TurnError::Cancelled));
        assert!(backend.stream_tokens()[0].is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_cancels_stream() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("none"),
            Scripted::Hang(vec!["Hel".to_string()]),
        ]));
        let orch = orchestrator(backend.clone(), math_registry());

        let mut stream = orch.process_stream("c1", "hi").await.unwrap();
        assert_eq!(stream.next_fragment().await.as_deref(), Some("Hel"));
        drop(stream);

        // Waits for the forward task to release the conversation
        let history = orch.history("c1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "Hel");
        assert_eq!(history[1].error, Some(TurnError::Cancelled));
        assert!(backend.stream_tokens()[0].is_cancelled());
    }

    #[tokio::test]
    async fn test_mid_stream_failure_appends_notice() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("none"),
            Scripted::BreakAfter(vec!["Par".to_string()], "connection reset".to_string()),
        ]));
        let orch = orchestrator(backend, math_registry());

        let stream = orch.process_stream("c1", "hi").await.unwrap();
        let parts: Vec<String> = stream.collect().await;
        assert_eq!(parts[0], "Par");
        assert!(parts[1].contains("connection reset"));

        let history = orch.history("c1").await;
        assert!(history[1].content.starts_with("Par"));
        assert!(matches!(history[1].error, Some(TurnError::Generation(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_idle_timeout() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("none"),
            Scripted::Hang(vec!["Hel".to_string()]),
        ]));
        let config = OrchestratorConfig::default()
            .with_stream_idle_timeout(Some(Duration::from_secs(5)));
        let orch = Orchestrator::new(backend, math_registry(), config);

        let turn = orch
            .process_stream("c1", "hi")
            .await
            .unwrap()
            .finish()
            .await
            .unwrap();
        assert!(turn.content.starts_with("Hel"));
        assert!(matches!(turn.error, Some(TurnError::Generation(ref r)) if r == "Timeout"));
    }

    #[tokio::test]
    async fn test_store_seeds_once_and_reset_clears_memory() {
        let store = Arc::new(RecordingStore::seeded(
            "c1",
            vec![Turn::user("stare"), Turn::assistant("odpowiedź")],
        ));
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("none"),
            text("one"),
            text("none"),
            text("two"),
        ]));
        let orch = orchestrator(backend.clone(), math_registry()).with_store(store.clone());

        orch.process("c1", "pierwsze").await.unwrap();
        assert!(backend.prompts()[1].contains("user: stare"));
        orch.process("c1", "drugie").await.unwrap();

        assert_eq!(store.loads(), 1);
        assert_eq!(orch.history("c1").await.len(), 6);
        assert_eq!(store.get("c1").len(), 6);

        orch.reset("c1").await;
        assert!(orch.history("c1").await.is_empty());
        assert_eq!(store.get("c1").len(), 6);
        assert_eq!(store.loads(), 1);
    }

    #[tokio::test]
    async fn test_release_frees_idle_conversations() {
        let store = Arc::new(RecordingStore::default());
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("none"),
            text("a"),
            text("none"),
            text("b"),
        ]));
        let orch = orchestrator(backend, math_registry()).with_store(store.clone());

        orch.process("c1", "pierwsze").await.unwrap();
        orch.process("c2", "drugie").await.unwrap();
        assert_eq!(orch.active_conversations().await, 2);

        assert!(orch.release("c1").await);
        assert!(orch.release("c2").await);
        assert!(orch.release("missing").await);
        assert_eq!(orch.active_conversations().await, 0);

        // Persisted turns come back on the next use
        assert_eq!(orch.history("c1").await.len(), 2);
        assert_eq!(store.loads(), 3);
    }

    #[tokio::test]
    async fn test_release_keeps_conversation_with_open_stream() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("none"),
            Scripted::Hang(vec!["Hel".to_string()]),
        ]));
        let orch = orchestrator(backend, math_registry());

        let mut stream = orch.process_stream("c1", "cześć").await.unwrap();
        assert_eq!(stream.next_fragment().await.as_deref(), Some("Hel"));
        assert!(!orch.release("c1").await);
        assert_eq!(orch.active_conversations().await, 1);

        stream.cancel();
        stream.finish().await.unwrap();
        assert!(orch.release("c1").await);
        assert_eq!(orch.active_conversations().await, 0);
    }

    #[tokio::test]
    async fn test_same_id_turns_are_serialised() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("none"),
            text("a"),
            text("none"),
            text("b"),
        ]));
        let orch = Arc::new(orchestrator(backend, math_registry()));

        let (first, second) = tokio::join!(orch.process("c1", "one"), orch.process("c1", "two"));
        first.unwrap();
        second.unwrap();

        let roles: Vec<Role> = orch.history("c1").await.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[tokio::test]
    async fn test_window_bounds_router_prompt() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let config = OrchestratorConfig::default().with_history_window(1);
        let orch = Orchestrator::new(backend.clone(), math_registry(), config);

        orch.process("c1", "first").await.unwrap();
        orch.process("c1", "second").await.unwrap();

        let router_prompt = &backend.prompts()[2];
        assert!(router_prompt.contains("user: second"));
        assert!(!router_prompt.contains("user: first"));
    }
}
