//! Response synthesizer: turns SQL results (or failures) into an answer,
//! and summarises a conversation into a report.

use std::sync::Arc;

use sqlchat_core::{CompletionService, ExecutionOutcome, Result, SqlChatError, Turn};

use crate::prompts::{PromptTemplates, missing_report_sections};

/// Phrases that count as the answer acknowledging a failed query.
const FAILURE_MARKERS: [&str; 6] = ["fail", "error", "could not", "couldn't", "unable", "not run"];

pub struct ResponseSynthesizer {
    completion: Arc<dyn CompletionService>,
    templates: Arc<PromptTemplates>,
    max_rows: usize,
}

impl ResponseSynthesizer {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        templates: Arc<PromptTemplates>,
        max_rows: usize,
    ) -> Self {
        Self {
            completion,
            templates,
            max_rows,
        }
    }

    /// Writes the natural-language answer for one executed (or failed) query.
    ///
    /// The answer is never empty. When `outcome` is a failure the answer
    /// always says so: if the generated text does not acknowledge the
    /// failure, the failure message is prefixed to it.
    ///
    /// # Errors
    ///
    /// `ResponseUnavailable` if the completion service fails or returns blank text.
    pub async fn respond(
        &self,
        question: &str,
        history: &[Turn],
        schema: &str,
        sql: &str,
        outcome: &ExecutionOutcome,
    ) -> Result<String> {
        let rendered = outcome.render(self.max_rows);
        let prompt = self
            .templates
            .response_prompt(schema, history, question, sql, &rendered)?;

        let answer = self.complete(&prompt).await?;

        match outcome {
            ExecutionOutcome::Failed(message) if !acknowledges_failure(&answer) => {
                tracing::debug!("answer did not mention the failed query; prefixing it");
                Ok(format!("The query failed: {message}.\n\n{answer}"))
            }
            _ => Ok(answer),
        }
    }

    /// Summarises the conversation into the four-section report.
    ///
    /// Uses neither schema nor SQL: the conversation is the only input.
    pub async fn report(&self, history: &[Turn]) -> Result<String> {
        let prompt = self.templates.report_prompt(history)?;
        let report = self.complete(&prompt).await?;

        let missing = missing_report_sections(&report);
        if !missing.is_empty() {
            tracing::warn!(?missing, "generated report is missing sections");
        }

        Ok(report)
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let text = self
            .completion
            .complete(prompt)
            .await
            .map_err(|e| SqlChatError::response_unavailable(e.to_string()))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(SqlChatError::response_unavailable(
                "completion service returned empty text",
            ));
        }
        Ok(text.to_string())
    }
}

fn acknowledges_failure(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    FAILURE_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sqlchat_core::{CompletionError, Dialect, QueryResult};
    use std::sync::Mutex;

    struct EchoCompletion {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionService for EchoCompletion {
        async fn complete(&self, prompt: &str) -> std::result::Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn responder(reply: &str) -> (ResponseSynthesizer, Arc<EchoCompletion>) {
        let completion = Arc::new(EchoCompletion {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        });
        let templates =
            Arc::new(PromptTemplates::new(Dialect::Postgres.profile(), vec![]).unwrap());
        (
            ResponseSynthesizer::new(completion.clone(), templates, 50),
            completion,
        )
    }

    #[tokio::test]
    async fn rows_are_rendered_into_the_prompt() {
        let (responder, completion) = responder("There are 7 rows.");
        let outcome = ExecutionOutcome::Rows(QueryResult::new(
            vec!["count".into()],
            vec![vec![Some("7".into())]],
        ));

        let answer = responder
            .respond("How many?", &[], "schema", "SELECT COUNT(*) FROM t", &outcome)
            .await
            .unwrap();

        assert_eq!(answer, "There are 7 rows.");
        assert!(completion.prompts.lock().unwrap()[0].contains("SQL Response: count\n7"));
    }

    #[tokio::test]
    async fn failure_is_prefixed_when_not_acknowledged() {
        let (responder, completion) = responder("Here is what I found.");
        let outcome = ExecutionOutcome::Failed("relation \"t\" does not exist".into());

        let answer = responder
            .respond("How many?", &[], "schema", "SELECT 1 FROM t", &outcome)
            .await
            .unwrap();

        assert!(answer.starts_with("The query failed: relation \"t\" does not exist."));
        assert!(completion.prompts.lock().unwrap()[0]
            .contains("SQL Response: Query failed: relation \"t\" does not exist"));
    }

    #[tokio::test]
    async fn acknowledged_failure_is_left_alone() {
        let (responder, _) = responder("The query failed because table t is missing.");
        let outcome = ExecutionOutcome::Failed("missing".into());
        let answer = responder
            .respond("q", &[], "schema", "SELECT 1", &outcome)
            .await
            .unwrap();
        assert_eq!(answer, "The query failed because table t is missing.");
    }

    #[tokio::test]
    async fn blank_completion_is_response_unavailable() {
        let (responder, _) = responder("   ");
        let outcome = ExecutionOutcome::Rows(QueryResult::default());
        let err = responder
            .respond("q", &[], "schema", "SELECT 1", &outcome)
            .await
            .unwrap_err();
        assert!(err.is_response_unavailable());
    }

    #[tokio::test]
    async fn report_uses_only_the_conversation() {
        let (responder, completion) = responder(
            "**Introduction** a\n**Key Findings** b\n**Trends/Patterns** c\n**Recommendations** d",
        );
        let history = vec![Turn::user("How many?"), Turn::assistant("42")];

        let report = responder.report(&history).await.unwrap();

        assert!(missing_report_sections(&report).is_empty());
        let prompts = completion.prompts.lock().unwrap();
        assert!(prompts[0].contains("Human: How many?"));
        assert!(!prompts[0].contains("<SCHEMA>"));
        assert!(!prompts[0].contains("<SQL>"));
    }
}
