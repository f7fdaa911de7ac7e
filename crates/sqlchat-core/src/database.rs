//! Database collaborator traits and result types.
//!
//! The pipeline talks to the database only through [`SchemaProvider`] and
//! [`QueryExecutor`]. Neither trait validates SQL: executing free-text SQL
//! produced by a language model is a known risk that deployments must bound
//! with database permissions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Number of rows rendered into prompt context unless configured otherwise.
pub const DEFAULT_MAX_ROWS: usize = 200;

/// Returns a textual description of the database's tables and columns.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Reads the live schema. Called fresh before every synthesis call; never cached.
    async fn get_table_info(&self) -> Result<String>;
}

/// Runs a SQL statement.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes `sql` and returns its rows.
    ///
    /// # Returns
    ///
    /// - `Ok(QueryResult)`: statement ran
    /// - `Err(SqlChatError::Execution)`: the database rejected the statement
    async fn execute(&self, sql: &str) -> Result<QueryResult>;
}

/// A live database handle: schema provider and executor over one connection,
/// with an explicit teardown tied to the session lifecycle.
#[async_trait]
pub trait DatabaseHandle: SchemaProvider + QueryExecutor {
    /// Releases the connection. Called once when the session ends.
    async fn close(&self);
}

/// Rows returned by a statement, with every value already rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    /// `None` is a SQL `NULL`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Renders a header line followed by one `|`-separated line per row.
    ///
    /// At most `max_rows` rows are rendered; the remainder is summarised in a
    /// trailer line.
    pub fn render(&self, max_rows: usize) -> String {
        let mut lines = Vec::with_capacity(self.rows.len().min(max_rows) + 2);
        if !self.columns.is_empty() {
            lines.push(self.columns.join(" | "));
        }

        if self.rows.is_empty() {
            lines.push("(0 rows)".to_string());
            return lines.join("\n");
        }

        for row in self.rows.iter().take(max_rows) {
            let values: Vec<&str> = row
                .iter()
                .map(|value| value.as_deref().unwrap_or("NULL"))
                .collect();
            lines.push(values.join(" | "));
        }

        if self.rows.len() > max_rows {
            lines.push(format!("... ({} more rows)", self.rows.len() - max_rows));
        }

        lines.join("\n")
    }
}

/// What the execution stage hands to the response stage.
///
/// Execution failure is not terminal: the message travels forward so the
/// answer can explain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Rows(QueryResult),
    Failed(String),
}

impl ExecutionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionOutcome::Failed(_))
    }

    /// Text placed in the `SQL Response` slot of the response prompt.
    pub fn render(&self, max_rows: usize) -> String {
        match self {
            ExecutionOutcome::Rows(result) => result.render(max_rows),
            ExecutionOutcome::Failed(message) => format!("Query failed: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_result() -> QueryResult {
        QueryResult::new(
            vec!["TOTAL_TRANSACTIONS".into()],
            vec![vec![Some("4821".into())]],
        )
    }

    #[test]
    fn renders_header_and_rows() {
        assert_eq!(count_result().render(10), "TOTAL_TRANSACTIONS\n4821");
    }

    #[test]
    fn renders_null_values() {
        let result = QueryResult::new(
            vec!["ID".into(), "NAME".into()],
            vec![vec![Some("1".into()), None]],
        );
        assert_eq!(result.render(10), "ID | NAME\n1 | NULL");
    }

    #[test]
    fn caps_rendered_rows() {
        let rows = (0..5).map(|i| vec![Some(i.to_string())]).collect();
        let result = QueryResult::new(vec!["N".into()], rows);
        assert_eq!(result.render(2), "N\n0\n1\n... (3 more rows)");
    }

    #[test]
    fn empty_result_is_explicit() {
        let result = QueryResult::new(vec!["N".into()], vec![]);
        assert_eq!(result.render(10), "N\n(0 rows)");
        assert_eq!(QueryResult::default().render(10), "(0 rows)");
    }

    #[test]
    fn failure_is_rendered_as_query_failed() {
        let outcome = ExecutionOutcome::Failed("relation \"swipe\" does not exist".into());
        assert!(outcome.is_failure());
        assert_eq!(
            outcome.render(10),
            "Query failed: relation \"swipe\" does not exist"
        );
    }
}
