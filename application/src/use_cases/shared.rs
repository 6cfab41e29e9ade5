//! Shared utilities for use cases.
//!
//! Every backend call goes through these helpers so a configured timeout is
//! applied uniformly. A timeout is reported as [`GatewayError::Timeout`],
//! which callers treat exactly like a connectivity failure.

use crate::ports::completion_backend::{CompletionBackend, GatewayError, StreamHandle};
use parley_domain::CompletionOptions;
use std::future::Future;
use std::time::Duration;

async fn with_timeout<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| GatewayError::Timeout)?,
        None => fut.await,
    }
}

/// Request a full completion, bounded by `timeout`.
pub(crate) async fn complete_with_timeout(
    backend: &dyn CompletionBackend,
    prompt: &str,
    options: &CompletionOptions,
    timeout: Option<Duration>,
) -> Result<String, GatewayError> {
    with_timeout(timeout, backend.complete(prompt, options)).await
}

/// Open a completion stream, bounding only the time to open it.
///
/// Per-fragment idle timeouts are applied by the consumer.
pub(crate) async fn open_stream_with_timeout(
    backend: &dyn CompletionBackend,
    prompt: &str,
    options: &CompletionOptions,
    timeout: Option<Duration>,
) -> Result<StreamHandle, GatewayError> {
    with_timeout(timeout, backend.complete_streaming(prompt, options)).await
}
