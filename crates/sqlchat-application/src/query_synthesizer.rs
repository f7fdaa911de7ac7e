//! Query synthesizer: question + history + schema -> one SQL statement.

use regex::Regex;
use std::sync::{Arc, LazyLock};

use sqlchat_core::{CompletionService, Result, SqlChatError, Turn, is_single_statement};

use crate::prompts::PromptTemplates;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("code fence pattern is valid")
});

static SQL_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^sql\s*query\s*:\s*").expect("label pattern is valid"));

/// Produces SQL text through a single completion call. No retries.
pub struct QuerySynthesizer {
    completion: Arc<dyn CompletionService>,
    templates: Arc<PromptTemplates>,
}

impl QuerySynthesizer {
    pub fn new(completion: Arc<dyn CompletionService>, templates: Arc<PromptTemplates>) -> Self {
        Self {
            completion,
            templates,
        }
    }

    /// Generates a single SQL statement answering `question`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `question` or `schema` is blank
    /// - `SynthesisUnavailable` if the completion service fails, or its answer
    ///   contains no SQL or more than one statement
    pub async fn synthesize(&self, question: &str, history: &[Turn], schema: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(SqlChatError::invalid_input("question must not be empty"));
        }
        if schema.trim().is_empty() {
            return Err(SqlChatError::invalid_input("schema must not be empty"));
        }

        let prompt = self.templates.sql_prompt(schema, history, question)?;

        let raw = self
            .completion
            .complete(&prompt)
            .await
            .map_err(|e| SqlChatError::synthesis_unavailable(e.to_string()))?;

        let sql = normalize_sql(&raw);
        if sql.is_empty() {
            return Err(SqlChatError::synthesis_unavailable(
                "completion service returned no SQL",
            ));
        }
        if !is_single_statement(&sql) {
            tracing::warn!(sql = %sql, "rejected multi-statement SQL");
            return Err(SqlChatError::synthesis_unavailable(
                "completion service returned more than one SQL statement",
            ));
        }

        tracing::debug!(sql = %sql, "synthesized SQL");
        Ok(sql)
    }
}

/// Strips code fences, a leading `SQL Query:` label and trailing terminators.
pub fn normalize_sql(raw: &str) -> String {
    let mut sql = raw.trim();

    if let Some(inner) = CODE_FENCE.captures(sql).and_then(|c| c.get(1)) {
        sql = inner.as_str().trim();
    }

    if let Some(label) = SQL_LABEL.find(sql) {
        sql = sql[label.end()..].trim();
    }

    sql.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .to_string()
}
