//! Per-turn orchestration states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the orchestrator is within a single question.
///
/// The regular path is `Idle -> AwaitingSynthesis -> AwaitingExecution ->
/// AwaitingResponse -> Idle`. A report request goes `Idle -> GeneratingReport
/// -> Idle`. A synthesis failure returns straight to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnState {
    /// Waiting for the next question.
    Idle,
    /// Generating SQL from the question.
    AwaitingSynthesis,
    /// Running the generated statement.
    AwaitingExecution,
    /// Writing the natural-language answer.
    AwaitingResponse,
    /// Summarising the conversation into a report.
    GeneratingReport,
}

impl TurnState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: TurnState) -> bool {
        use TurnState::*;

        matches!(
            (self, next),
            (Idle, AwaitingSynthesis)
                | (Idle, GeneratingReport)
                | (AwaitingSynthesis, AwaitingExecution)
                | (AwaitingSynthesis, Idle)
                | (AwaitingExecution, AwaitingResponse)
                | (AwaitingResponse, Idle)
                | (GeneratingReport, Idle)
        )
    }
}

impl Default for TurnState {
    fn default() -> Self {
        TurnState::Idle
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnState::Idle => "idle",
            TurnState::AwaitingSynthesis => "awaiting_synthesis",
            TurnState::AwaitingExecution => "awaiting_execution",
            TurnState::AwaitingResponse => "awaiting_response",
            TurnState::GeneratingReport => "generating_report",
        };
        f.write_str(name)
    }
}
