//! PostgreSQL implementation of the schema provider and query executor.
//!
//! One long-lived handle per session. Statements run through the simple
//! query protocol so every value comes back in text form, inside a
//! `READ ONLY` transaction that is always rolled back. Text holding more
//! than one statement is refused before it reaches the connection.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Executor, Row, Statement};

use sqlchat_core::{
    ConnectionDescriptor, DatabaseHandle, QueryExecutor, QueryResult, Result, SchemaProvider,
    SqlChatError, is_single_statement,
};

const SCHEMA_QUERY: &str = r#"
SELECT c.table_schema::text,
       c.table_name::text,
       c.column_name::text,
       c.data_type::text,
       c.is_nullable::text
FROM information_schema.columns c
JOIN information_schema.tables t
  ON t.table_schema = c.table_schema AND t.table_name = c.table_name
WHERE c.table_schema NOT IN ('pg_catalog', 'information_schema')
  AND t.table_type IN ('BASE TABLE', 'VIEW')
ORDER BY c.table_schema, c.table_name, c.ordinal_position
"#;

/// Shared database handle acquired once per session.
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
    target: String,
}

impl PgDatabase {
    /// Opens the handle and checks it with a round trip.
    ///
    /// Failures are reported as `SqlChatError::Connection`.
    pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<Self> {
        descriptor.validate()?;

        let options = PgConnectOptions::new()
            .host(&descriptor.host)
            .port(descriptor.port)
            .username(&descriptor.user)
            .password(&descriptor.password)
            .database(&descriptor.service_name)
            .application_name("sqlchat");

        // Turns are sequential, so one connection is enough.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| SqlChatError::connection(e.to_string()))?;

        let target = descriptor.display_target();
        tracing::info!(database = %target, "connected to database");

        Ok(Self { pool, target })
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl DatabaseHandle for PgDatabase {
    async fn close(&self) {
        self.pool.close().await;
        tracing::info!(database = %self.target, "database connection closed");
    }
}

#[async_trait]
impl SchemaProvider for PgDatabase {
    async fn get_table_info(&self) -> Result<String> {
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(SCHEMA_QUERY)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SqlChatError::execution(format!("schema introspection failed: {e}")))?;

        let columns: Vec<ColumnInfo> = rows
            .into_iter()
            .map(|(schema, table, column, data_type, nullable)| ColumnInfo {
                schema,
                table,
                column,
                data_type,
                nullable: nullable.eq_ignore_ascii_case("YES"),
            })
            .collect();

        tracing::debug!(columns = columns.len(), "schema snapshot read");
        Ok(render_schema(&columns))
    }
}

#[async_trait]
impl QueryExecutor for PgDatabase {
    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        // One simple-protocol message may carry several statements; a
        // `COMMIT` among them would end the read-only transaction.
        if !is_single_statement(sql) {
            return Err(SqlChatError::execution(
                "only a single SQL statement may be executed",
            ));
        }

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| SqlChatError::execution(e.to_string()))?;

        (&mut *conn)
            .execute("BEGIN READ ONLY")
            .await
            .map_err(|e| SqlChatError::execution(e.to_string()))?;

        let fetched = (&mut *conn).fetch_all(sql).await;

        let no_rows = matches!(&fetched, Ok(rows) if rows.is_empty());
        let columns = if no_rows {
            statement_columns(&mut conn, sql).await
        } else {
            Vec::new()
        };

        if let Err(e) = (&mut *conn).execute("ROLLBACK").await {
            tracing::warn!(error = %e, "rollback after query failed; discarding connection");
            conn.close_on_drop();
        }

        let rows = fetched.map_err(|e| SqlChatError::execution(e.to_string()))?;
        rows_to_result(columns, &rows)
    }
}

/// Column names of a statement that produced no rows, read from its
/// prepared description.
async fn statement_columns(conn: &mut PgConnection, sql: &str) -> Vec<String> {
    match (&mut *conn).prepare(sql).await {
        Ok(statement) => statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "could not describe empty result");
            Vec::new()
        }
    }
}

/// Builds the text result. Column names come from the first row, or from
/// `columns` when there are no rows.
fn rows_to_result(columns: Vec<String>, rows: &[PgRow]) -> Result<QueryResult> {
    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or(columns);

    let values = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|i| {
                    // Simple-protocol rows are text encoded.
                    row.try_get_unchecked::<Option<String>, _>(i)
                        .map_err(|e| SqlChatError::execution(e.to_string()))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QueryResult::new(columns, values))
}

/// One row of `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Renders columns as `CREATE TABLE` blocks, one per table, in input order.
pub fn render_schema(columns: &[ColumnInfo]) -> String {
    if columns.is_empty() {
        return "(no tables visible to this user)".to_string();
    }

    let mut blocks: Vec<String> = Vec::new();
    let mut current: Option<(&str, &str)> = None;
    let mut lines: Vec<String> = Vec::new();

    let flush = |key: Option<(&str, &str)>, lines: &mut Vec<String>, blocks: &mut Vec<String>| {
        if let Some((schema, table)) = key {
            blocks.push(format!(
                "CREATE TABLE {}.{} (\n{}\n)",
                schema,
                table,
                lines.join(",\n")
            ));
            lines.clear();
        }
    };

    for info in columns {
        let key = (info.schema.as_str(), info.table.as_str());
        if current != Some(key) {
            flush(current, &mut lines, &mut blocks);
            current = Some(key);
        }
        let null = if info.nullable { "" } else { " NOT NULL" };
        lines.push(format!("\t{} {}{}", info.column, info.data_type, null));
    }
    flush(current, &mut lines, &mut blocks);

    blocks.join("\n\n")
}
