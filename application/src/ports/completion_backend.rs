//! Completion backend port
//!
//! Defines the interface for requesting text completions from a language
//! model provider.

use async_trait::async_trait;
use parley_domain::{CompletionOptions, StreamEvent};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors that can occur during backend operations.
///
/// The orchestrator treats every variant as unavailability of the model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Rate or resource limit: {0}")]
    ResourceLimit(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Transport closed")]
    TransportClosed,
}

/// Backend for text completion
///
/// This port defines how the application layer talks to a model.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Identifier used in logs (e.g. the model name)
    fn name(&self) -> &str;

    /// Request a full completion
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, GatewayError>;

    /// Request a streaming completion.
    ///
    /// Default implementation calls `complete()` and wraps the result in a
    /// single `Completed` event, so backends without streaming still work.
    async fn complete_streaming(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<StreamHandle, GatewayError> {
        let result = self.complete(prompt, options).await?;
        let (tx, rx) = mpsc::channel(1);
        // Send Completed event; the receiver may already be gone
        let _ = tx.send(StreamEvent::Completed(result)).await;
        Ok(StreamHandle::new(rx))
    }
}

/// Handle for receiving streaming events from a backend.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` plus the cancellation token of the
/// producing task. Dropping the handle cancels the token, so the backend can
/// abort the underlying request.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self::with_cancellation(receiver, CancellationToken::new())
    }

    /// Create a handle whose drop or [`cancel`](Self::cancel) fires `cancel`
    pub fn with_cancellation(
        receiver: mpsc::Receiver<StreamEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self { receiver, cancel }
    }

    /// Ask the producer to stop
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => {
                    return Err(GatewayError::RequestFailed(e));
                }
            }
        }
        // Channel closed without Completed: return what we have
        Ok(full_text)
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
