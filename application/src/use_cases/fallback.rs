//! Conversational fallback use case.
//!
//! Used when the router picks no tool: the preamble, the trailing history
//! and the latest utterance go straight to the model.

use crate::ports::completion_backend::{CompletionBackend, GatewayError, StreamHandle};
use crate::use_cases::shared::{complete_with_timeout, open_stream_with_timeout};
use parley_domain::{CompletionOptions, ConversationContext, PromptTemplate};
use std::sync::Arc;
use std::time::Duration;

pub struct FallbackGenerator {
    backend: Arc<dyn CompletionBackend>,
    options: CompletionOptions,
    timeout: Option<Duration>,
    preamble: String,
    window: usize,
}

impl FallbackGenerator {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        options: CompletionOptions,
        timeout: Option<Duration>,
        preamble: impl Into<String>,
        window: usize,
    ) -> Self {
        Self {
            backend,
            options,
            timeout,
            preamble: preamble.into(),
            window,
        }
    }

    /// Build the prompt; the context's last turn is the utterance to answer.
    pub fn prompt(&self, context: &ConversationContext) -> String {
        let history = ConversationContext::render(context.history_before_latest(self.window));
        let utterance = context.last_user_utterance().unwrap_or_default();
        PromptTemplate::fallback_prompt(&self.preamble, &history, utterance)
    }

    pub async fn generate(&self, context: &ConversationContext) -> Result<String, GatewayError> {
        let prompt = self.prompt(context);
        complete_with_timeout(self.backend.as_ref(), &prompt, &self.options, self.timeout).await
    }

    pub async fn generate_streaming(
        &self,
        context: &ConversationContext,
    ) -> Result<StreamHandle, GatewayError> {
        let prompt = self.prompt(context);
        open_stream_with_timeout(self.backend.as_ref(), &prompt, &self.options, self.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::*;
    use parley_domain::Turn;

    fn context() -> ConversationContext {
        let mut ctx = ConversationContext::new();
        for i in 0..4 {
            ctx.push(Turn::user(format!("pytanie {}", i)));
            ctx.push(Turn::assistant(format!("odpowiedź {}", i)));
        }
        ctx.push(Turn::user("Jak się masz?"));
        ctx
    }

    #[test]
    fn test_prompt_uses_window_before_latest() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let generator =
            FallbackGenerator::new(backend, CompletionOptions::default(), None, "Preamble.", 2);

        let prompt = generator.prompt(&context());
        assert!(prompt.starts_with("Preamble.\n\n"));
        assert!(prompt.contains("user: pytanie 3\nassistant: odpowiedź 3"));
        assert!(!prompt.contains("pytanie 2"));
        assert!(prompt.ends_with("user: Jak się masz?\nassistant:"));
    }

    #[tokio::test]
    async fn test_generate_and_stream() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            text("Dobrze!"),
            fragments(&["Dob", "rze!"]),
        ]));
        let generator =
            FallbackGenerator::new(backend.clone(), CompletionOptions::default(), None, "P", 5);

        assert_eq!(generator.generate(&context()).await.unwrap(), "Dobrze!");
        let handle = generator.generate_streaming(&context()).await.unwrap();
        assert_eq!(handle.collect_text().await.unwrap(), "Dobrze!");
        assert_eq!(backend.calls(), 2);
    }
}
