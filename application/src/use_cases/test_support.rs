//! Scripted collaborators shared by the use case tests.

use crate::ports::completion_backend::{CompletionBackend, GatewayError, StreamHandle};
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::conversation_store::{ConversationStore, StoreError};
use async_trait::async_trait;
use parley_domain::{
    ArgumentType, CompletionOptions, StreamEvent, ToolDefinition, ToolError, ToolParameter,
    ToolRegistry, ToolSpec, Turn, ValidatedArguments,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A scripted backend reply
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    /// Whole text; streamed as a single `Completed` event
    Text(String),
    /// Streamed as one `Delta` per fragment, then `Completed`
    Fragments(Vec<String>),
    /// Streams the fragments, then stays open until cancelled
    Hang(Vec<String>),
    /// Streams the fragments, then an `Error` event
    BreakAfter(Vec<String>, String),
    /// The call itself fails
    Fail(GatewayError),
}

pub(crate) fn text(s: &str) -> Scripted {
    Scripted::Text(s.to_string())
}

pub(crate) fn fragments(parts: &[&str]) -> Scripted {
    Scripted::Fragments(parts.iter().map(|s| s.to_string()).collect())
}

/// Backend that returns scripted replies in order and records every prompt
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    replies: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<String>>,
    stream_tokens: Mutex<Vec<CancellationToken>>,
}

impl ScriptedBackend {
    pub(crate) fn new(replies: Vec<Scripted>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn stream_tokens(&self) -> Vec<CancellationToken> {
        self.stream_tokens.lock().unwrap().clone()
    }

    fn next(&self, prompt: &str) -> Scripted {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| text("(no more replies)"))
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        match self.next(prompt) {
            Scripted::Text(t) => Ok(t),
            Scripted::Fragments(parts) | Scripted::Hang(parts) => Ok(parts.concat()),
            Scripted::BreakAfter(_, e) => Err(GatewayError::RequestFailed(e)),
            Scripted::Fail(e) => Err(e),
        }
    }

    async fn complete_streaming(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<StreamHandle, GatewayError> {
        let reply = self.next(prompt);
        if let Scripted::Fail(e) = reply {
            return Err(e);
        }

        let (tx, rx) = mpsc::channel(16);
        let token = CancellationToken::new();
        self.stream_tokens.lock().unwrap().push(token.clone());
        let task_token = token.clone();

        tokio::spawn(async move {
            match reply {
                Scripted::Text(t) => {
                    let _ = tx.send(StreamEvent::Completed(t)).await;
                }
                Scripted::Fragments(parts) => {
                    for part in &parts {
                        let _ = tx.send(StreamEvent::Delta(part.clone())).await;
                    }
                    let _ = tx.send(StreamEvent::Completed(parts.concat())).await;
                }
                Scripted::Hang(parts) => {
                    for part in parts {
                        let _ = tx.send(StreamEvent::Delta(part)).await;
                    }
                    task_token.cancelled().await;
                }
                Scripted::BreakAfter(parts, e) => {
                    for part in parts {
                        let _ = tx.send(StreamEvent::Delta(part)).await;
                    }
                    let _ = tx.send(StreamEvent::Error(e)).await;
                }
                Scripted::Fail(_) => {}
            }
        });

        Ok(StreamHandle::with_cancellation(rx, token))
    }
}

/// Tool that counts invocations and returns a fixed output
pub(crate) struct CountingTool {
    calls: AtomicUsize,
    output: Result<String, ToolError>,
}

impl CountingTool {
    pub(crate) fn ok(output: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            output: Ok(output.to_string()),
        })
    }

    pub(crate) fn failing(error: ToolError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            output: Err(error),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl parley_domain::ToolCapability for CountingTool {
    async fn invoke(&self, _args: &ValidatedArguments) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.output.clone()
    }
}

pub(crate) fn add_tool() -> ToolSpec {
    ToolSpec::from_sync_fn(
        ToolDefinition::new("add", "Adds two numbers")
            .with_parameter(ToolParameter::new("a", "First", true).with_type(ArgumentType::Float))
            .with_parameter(ToolParameter::new("b", "Second", true).with_type(ArgumentType::Float)),
        |args| {
            let sum = args.require_f64("a")? + args.require_f64("b")?;
            Ok(if sum.fract() == 0.0 {
                format!("{}", sum as i64)
            } else {
                sum.to_string()
            })
        },
    )
}

pub(crate) fn add_task_definition() -> ToolDefinition {
    ToolDefinition::new("add_task", "Adds a task to the list")
        .with_parameter(ToolParameter::new("description", "Task text", true))
}

pub(crate) fn task_ids_definition(name: &str) -> ToolDefinition {
    ToolDefinition::new(name, format!("{} by ids", name)).with_parameter(
        ToolParameter::new("task_ids", "Task ids", true)
            .with_type(ArgumentType::list_of(ArgumentType::Integer)),
    )
}

pub(crate) fn registry(specs: Vec<ToolSpec>) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for spec in specs {
        registry.register(spec).unwrap();
    }
    Arc::new(registry)
}

/// In-memory store that records appends
#[derive(Default)]
pub(crate) struct RecordingStore {
    pub(crate) turns: Mutex<HashMap<String, Vec<Turn>>>,
    loads: AtomicUsize,
}

impl RecordingStore {
    pub(crate) fn seeded(id: &str, turns: Vec<Turn>) -> Self {
        let store = Self::default();
        store.turns.lock().unwrap().insert(id.to_string(), turns);
        store
    }

    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub(crate) fn get(&self, id: &str) -> Vec<Turn> {
        self.turns
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConversationStore for RecordingStore {
    async fn load(&self, id: &str) -> Result<Vec<Turn>, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(id))
    }

    async fn append(&self, id: &str, turn: &Turn) -> Result<(), StoreError> {
        self.turns
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push(turn.clone());
        Ok(())
    }
}

/// Logger that keeps every event type in order
#[derive(Default)]
pub(crate) struct RecordingLogger {
    events: Mutex<Vec<ConversationEvent>>,
}

impl RecordingLogger {
    pub(crate) fn event_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.kind.as_str())
            .collect()
    }
}

impl ConversationLogger for RecordingLogger {
    fn log(&self, event: ConversationEvent) {
        self.events.lock().unwrap().push(event);
    }
}
