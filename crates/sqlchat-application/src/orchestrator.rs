//! Per-question control flow.
//!
//! Sequences schema fetch, SQL synthesis, execution and answer synthesis,
//! and appends the resulting turn pair to the conversation. Every external
//! failure is converted here into forwarded text or a user-visible notice;
//! `handle` itself never fails.

use std::sync::Arc;

use tracing::Instrument;

use sqlchat_core::{
    Conversation, ExecutionOutcome, QueryExecutor, SchemaProvider, SqlChatError, Turn, TurnState,
};

use crate::query_synthesizer::QuerySynthesizer;
use crate::response_synthesizer::ResponseSynthesizer;

/// Phrase that routes a question to the report path (matched case-insensitively).
pub const REPORT_TRIGGER: &str = "generate report";

/// Notice shown when the answer could not be written.
pub const RESPONSE_FAILURE_NOTICE: &str = "Sorry, I couldn't get a response right now.";

/// Result of one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The question was empty; nothing was recorded.
    Ignored,
    /// Regular path completed. `answer` also covers explained execution failures.
    Answered { sql: String, answer: String },
    /// Report path completed.
    Report { report: String },
    /// The turn was aborted; `notice` was recorded as the assistant turn.
    Failed { notice: String },
}

impl TurnOutcome {
    /// Text recorded as the assistant turn, if any.
    pub fn assistant_text(&self) -> Option<&str> {
        match self {
            TurnOutcome::Ignored => None,
            TurnOutcome::Answered { answer, .. } => Some(answer),
            TurnOutcome::Report { report } => Some(report),
            TurnOutcome::Failed { notice } => Some(notice),
        }
    }
}

/// Whether `question` asks for a conversation report.
pub fn is_report_request(question: &str) -> bool {
    question.to_lowercase().contains(REPORT_TRIGGER)
}

pub struct Orchestrator {
    schema: Arc<dyn SchemaProvider>,
    executor: Arc<dyn QueryExecutor>,
    synthesizer: QuerySynthesizer,
    responder: ResponseSynthesizer,
    state: TurnState,
    turns_handled: u64,
}

impl Orchestrator {
    pub fn new(
        schema: Arc<dyn SchemaProvider>,
        executor: Arc<dyn QueryExecutor>,
        synthesizer: QuerySynthesizer,
        responder: ResponseSynthesizer,
    ) -> Self {
        Self {
            schema,
            executor,
            synthesizer,
            responder,
            state: TurnState::Idle,
            turns_handled: 0,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Handles one question against `conversation`.
    ///
    /// Empty or whitespace-only questions are ignored. Every other question
    /// appends exactly two turns: the user's question and the assistant's
    /// answer, report, or failure notice.
    pub async fn handle(&mut self, conversation: &mut Conversation, question: &str) -> TurnOutcome {
        if question.trim().is_empty() {
            return TurnOutcome::Ignored;
        }

        self.turns_handled += 1;
        let span = tracing::info_span!("turn", turn = self.turns_handled);

        // History is everything said before this question.
        let history = conversation.turns().to_vec();
        conversation.push(Turn::user(question));

        let outcome = async {
            if is_report_request(question) {
                self.run_report(&history).await
            } else {
                self.run_query(question, &history).await
            }
        }
        .instrument(span)
        .await;

        if let Some(text) = outcome.assistant_text() {
            conversation.push(Turn::assistant(text));
        }
        outcome
    }

    async fn run_query(&mut self, question: &str, history: &[Turn]) -> TurnOutcome {
        self.transition(TurnState::AwaitingSynthesis);

        let sql = match self.synthesize(question, history).await {
            Ok(sql) => sql,
            Err(err) => {
                tracing::warn!(error = %err, "SQL synthesis failed");
                self.transition(TurnState::Idle);
                return TurnOutcome::Failed {
                    notice: format!("Sorry, I couldn't generate a SQL query for that question. {err}"),
                };
            }
        };

        self.transition(TurnState::AwaitingExecution);
        let outcome = match self.executor.execute(&sql).await {
            Ok(result) => {
                tracing::info!(rows = result.row_count(), "query executed");
                ExecutionOutcome::Rows(result)
            }
            Err(err) => {
                tracing::warn!(error = %err, "query execution failed");
                ExecutionOutcome::Failed(failure_message(err))
            }
        };

        self.transition(TurnState::AwaitingResponse);
        let schema = match self.schema.get_table_info().await {
            Ok(schema) => schema,
            Err(err) => {
                tracing::warn!(error = %err, "schema unavailable for response");
                format!("(schema unavailable: {err})")
            }
        };

        let result = self
            .responder
            .respond(question, history, &schema, &sql, &outcome)
            .await;
        self.transition(TurnState::Idle);

        match result {
            Ok(answer) => TurnOutcome::Answered { sql, answer },
            Err(err) => {
                tracing::error!(error = %err, "response synthesis failed");
                TurnOutcome::Failed {
                    notice: RESPONSE_FAILURE_NOTICE.to_string(),
                }
            }
        }
    }

    async fn synthesize(&self, question: &str, history: &[Turn]) -> sqlchat_core::Result<String> {
        let schema = self.schema.get_table_info().await.map_err(|err| {
            SqlChatError::synthesis_unavailable(format!("schema could not be read: {err}"))
        })?;
        self.synthesizer.synthesize(question, history, &schema).await
    }

    async fn run_report(&mut self, history: &[Turn]) -> TurnOutcome {
        self.transition(TurnState::GeneratingReport);
        let result = self.responder.report(history).await;
        self.transition(TurnState::Idle);

        match result {
            Ok(report) => TurnOutcome::Report { report },
            Err(err) => {
                tracing::error!(error = %err, "report generation failed");
                TurnOutcome::Failed {
                    notice: RESPONSE_FAILURE_NOTICE.to_string(),
                }
            }
        }
    }

    fn transition(&mut self, next: TurnState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }
}

/// Execution errors travel forward as their bare message.
fn failure_message(err: SqlChatError) -> String {
    match err {
        SqlChatError::Execution(message) => message,
        other => other.to_string(),
    }
}
