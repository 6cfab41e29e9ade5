//! Router use case.
//!
//! Asks the model which registered tool, if any, the latest utterance needs,
//! and maps its free-form reply onto a [`RouterDecision`].

use crate::ports::completion_backend::{CompletionBackend, GatewayError};
use crate::use_cases::shared::complete_with_timeout;
use parley_domain::{
    CompletionOptions, ConversationContext, PromptTemplate, RouterDecision, ToolRegistry, Turn,
    single_line_preview,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct Router {
    backend: Arc<dyn CompletionBackend>,
    registry: Arc<ToolRegistry>,
    options: CompletionOptions,
    timeout: Option<Duration>,
}

impl Router {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        registry: Arc<ToolRegistry>,
        options: CompletionOptions,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            registry,
            options,
            timeout,
        }
    }

    /// Decide on a tool for the trailing `window`, which ends with the
    /// latest user turn.
    ///
    /// With no tools registered there is nothing to choose from, so the
    /// backend is not called.
    pub async fn route(&self, window: &[Turn]) -> Result<RouterDecision, GatewayError> {
        if self.registry.is_empty() {
            return Ok(RouterDecision::None);
        }

        let prompt = PromptTemplate::router_prompt(
            &self.registry.describe_all(),
            &ConversationContext::render(window),
        );
        let response =
            complete_with_timeout(self.backend.as_ref(), &prompt, &self.options, self.timeout)
                .await?;

        let decision = RouterDecision::from_response(&response, self.registry.names());
        debug!(
            "Router reply '{}' -> {:?}",
            single_line_preview(&response, 80),
            decision
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::*;
    use parley_domain::ToolSpec;

    fn named(name: &str) -> ToolSpec {
        ToolSpec::from_sync_fn(
            parley_domain::ToolDefinition::new(name, format!("{} tool", name)),
            |_| Ok(String::new()),
        )
    }

    #[tokio::test]
    async fn test_first_registered_tool_wins() {
        let backend = Arc::new(ScriptedBackend::new(vec![text("Use add_task, or maybe add")]));
        let router = Router::new(
            backend.clone(),
            registry(vec![named("add"), named("add_task")]),
            CompletionOptions::deterministic(),
            None,
        );

        let decision = router.route(&[Turn::user("dodaj zadanie")]).await.unwrap();
        assert_eq!(decision, RouterDecision::Tool("add".to_string()));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_prompt_carries_tools_and_window() {
        let backend = Arc::new(ScriptedBackend::new(vec![text("none")]));
        let router = Router::new(
            backend.clone(),
            registry(vec![named("list_tasks")]),
            CompletionOptions::deterministic(),
            None,
        );

        let decision = router
            .route(&[Turn::user("hej"), Turn::assistant("cześć"), Turn::user("co słychać?")])
            .await
            .unwrap();
        assert!(decision.is_none());

        let prompt = &backend.prompts()[0];
        assert!(prompt.contains("- list_tasks: list_tasks tool"));
        assert!(prompt.contains("assistant: cześć\nuser: co słychać?"));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let backend = Arc::new(ScriptedBackend::new(vec![Scripted::Fail(
            GatewayError::ConnectionError("refused".into()),
        )]));
        let router = Router::new(
            backend,
            registry(vec![named("add")]),
            CompletionOptions::deterministic(),
            None,
        );

        let err = router.route(&[Turn::user("2+2")]).await.unwrap_err();
        assert_eq!(err, GatewayError::ConnectionError("refused".into()));
    }

    #[tokio::test]
    async fn test_empty_registry_skips_backend() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let router = Router::new(
            backend.clone(),
            Arc::new(ToolRegistry::new()),
            CompletionOptions::deterministic(),
            None,
        );

        assert!(router.route(&[Turn::user("hi")]).await.unwrap().is_none());
        assert_eq!(backend.calls(), 0);
    }
}
