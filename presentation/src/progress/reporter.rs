//! Progress reporting for turn execution

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use parley_application::{TurnProgressNotifier, TurnStage};
use parley_domain::RouterDecision;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Shows a spinner per conversation while a turn is routed and tools run
pub struct ProgressReporter {
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    pub(crate) fn stage_display_name(stage: TurnStage) -> &'static str {
        match stage {
            TurnStage::Routing => "Choosing a tool...",
            TurnStage::Extracting => "Reading arguments...",
            TurnStage::Validating => "Checking arguments...",
            TurnStage::Executing => "Running tool...",
            TurnStage::Finalizing => "Writing reply...",
            TurnStage::Generating => "Thinking...",
        }
    }

    /// Remove the spinner for `conversation_id` before the reply is printed
    pub fn clear(&self, conversation_id: &str) {
        if let Ok(mut bars) = self.bars.lock()
            && let Some(bar) = bars.remove(conversation_id)
        {
            bar.finish_and_clear();
        }
    }

    /// Number of conversations with a live spinner
    pub fn active(&self) -> usize {
        self.bars.lock().map(|bars| bars.len()).unwrap_or(0)
    }

    fn with_bar(&self, conversation_id: &str, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let bar = bars.entry(conversation_id.to_string()).or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(Self::spinner_style());
            bar.set_prefix(conversation_id.to_string());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        f(bar);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnProgressNotifier for ProgressReporter {
    fn on_stage(&self, conversation_id: &str, stage: TurnStage) {
        self.with_bar(conversation_id, |bar| {
            bar.set_message(Self::stage_display_name(stage));
        });
    }

    fn on_route(&self, conversation_id: &str, decision: &RouterDecision) {
        if let Some(tool) = decision.tool_name() {
            self.with_bar(conversation_id, |bar| {
                bar.println(format!("  {} {}", "->".cyan(), tool.bold()));
            });
        }
    }

    fn on_turn_complete(&self, conversation_id: &str, _success: bool) {
        self.clear(conversation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_per_conversation() {
        let reporter = ProgressReporter::new();
        reporter.on_stage("a", TurnStage::Routing);
        reporter.on_stage("b", TurnStage::Routing);
        reporter.on_stage("a", TurnStage::Executing);
        assert_eq!(reporter.active(), 2);

        reporter.on_turn_complete("a", true);
        assert_eq!(reporter.active(), 1);

        reporter.clear("b");
        assert_eq!(reporter.active(), 0);
    }

    #[test]
    fn test_clear_unknown_conversation_is_noop() {
        let reporter = ProgressReporter::new();
        reporter.clear("missing");
        assert_eq!(reporter.active(), 0);
    }

    #[test]
    fn test_every_stage_has_a_message() {
        for stage in [
            TurnStage::Routing,
            TurnStage::Extracting,
            TurnStage::Validating,
            TurnStage::Executing,
            TurnStage::Finalizing,
            TurnStage::Generating,
        ] {
            assert!(!ProgressReporter::stage_display_name(stage).is_empty());
        }
    }
}
