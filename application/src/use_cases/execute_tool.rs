//! Tool executor use case.
//!
//! Runs a capability with validated arguments behind a failure boundary,
//! then phrases the raw output through a finalize completion. Nothing a
//! capability does (error or panic) escapes this module as anything other
//! than an [`ExecutionError`].

use crate::ports::completion_backend::{CompletionBackend, StreamHandle};
use crate::use_cases::shared::{complete_with_timeout, open_stream_with_timeout};
use futures::FutureExt;
use parley_domain::{
    CompletionOptions, ExecutionError, ExecutionErrorKind, ExecutionResult, PromptTemplate,
    ToolSpec, ValidatedArguments,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Invoke a tool, converting capability errors and panics into
/// [`ExecutionError`]s that name the tool.
pub async fn invoke_isolated(spec: &ToolSpec, args: &ValidatedArguments) -> ExecutionResult {
    match AssertUnwindSafe(spec.invoke(args)).catch_unwind().await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ExecutionError::new(
            spec.name(),
            ExecutionErrorKind::ToolFailed,
            e.to_string(),
        )),
        Err(panic) => Err(ExecutionError::new(
            spec.name(),
            ExecutionErrorKind::Panicked,
            panic_message(panic.as_ref()),
        )),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}

pub struct ToolExecutor {
    backend: Arc<dyn CompletionBackend>,
    options: CompletionOptions,
    timeout: Option<Duration>,
    language: String,
}

impl ToolExecutor {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        options: CompletionOptions,
        timeout: Option<Duration>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            options,
            timeout,
            language: language.into(),
        }
    }

    /// Run the capability and return its raw output
    pub async fn execute(&self, spec: &ToolSpec, args: &ValidatedArguments) -> ExecutionResult {
        debug!("Executing tool '{}' with {} argument(s)", spec.name(), args.len());
        let result = invoke_isolated(spec, args).await;
        if let Err(e) = &result {
            warn!("{}", e);
        }
        result
    }

    /// Phrase a raw tool output as a reply to `utterance`
    pub async fn finalize(
        &self,
        tool_name: &str,
        raw_output: &str,
        utterance: &str,
    ) -> ExecutionResult {
        let prompt =
            PromptTemplate::finalize_prompt(tool_name, raw_output, utterance, &self.language);
        complete_with_timeout(self.backend.as_ref(), &prompt, &self.options, self.timeout)
            .await
            .map_err(|e| {
                ExecutionError::new(tool_name, ExecutionErrorKind::FinalizeFailed, e.to_string())
            })
    }

    /// Streaming variant of [`finalize`](Self::finalize)
    pub async fn finalize_streaming(
        &self,
        tool_name: &str,
        raw_output: &str,
        utterance: &str,
    ) -> Result<StreamHandle, ExecutionError> {
        let prompt =
            PromptTemplate::finalize_prompt(tool_name, raw_output, utterance, &self.language);
        open_stream_with_timeout(self.backend.as_ref(), &prompt, &self.options, self.timeout)
            .await
            .map_err(|e| {
                ExecutionError::new(tool_name, ExecutionErrorKind::FinalizeFailed, e.to_string())
            })
    }
}
