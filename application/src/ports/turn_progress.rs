//! Turn progress notification port
//!
//! Defines the interface for reporting which stage a turn is in, so the
//! presentation layer can show a spinner message while the model works.

use parley_domain::RouterDecision;
use std::fmt;

/// Stage of a single turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnStage {
    Routing,
    Extracting,
    Validating,
    Executing,
    Finalizing,
    Generating,
}

impl TurnStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnStage::Routing => "routing",
            TurnStage::Extracting => "extracting",
            TurnStage::Validating => "validating",
            TurnStage::Executing => "executing",
            TurnStage::Finalizing => "finalizing",
            TurnStage::Generating => "generating",
        }
    }
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback for progress updates during a turn
///
/// Implementations live in the presentation layer. All methods default to
/// no-ops.
pub trait TurnProgressNotifier: Send + Sync {
    /// Called when a turn enters a stage
    fn on_stage(&self, _conversation_id: &str, _stage: TurnStage) {}

    /// Called once the router has decided
    fn on_route(&self, _conversation_id: &str, _decision: &RouterDecision) {}

    /// Called when a turn has produced its final assistant turn
    fn on_turn_complete(&self, _conversation_id: &str, _success: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoTurnProgress;

impl TurnProgressNotifier for NoTurnProgress {}
