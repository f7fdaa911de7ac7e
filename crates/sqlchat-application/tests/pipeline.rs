use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use sqlchat_application::orchestrator::RESPONSE_FAILURE_NOTICE;
use sqlchat_application::prompts::missing_report_sections;
use sqlchat_application::{SessionContext, SessionSettings, TurnOutcome};
use sqlchat_core::{
    CompletionError, CompletionService, DatabaseHandle, Dialect, QueryExecutor, QueryResult,
    Result, Role, SchemaProvider, SqlChatError, TurnState,
};

const SWIPE_SCHEMA: &str = "CREATE TABLE SWIPE_TRANSACTIONS (\n\tID NUMBER NOT NULL,\n\tTRANSACTION_TYPE VARCHAR2(20)\n)";

/// Database double that counts schema reads and scripts execution results.
struct MockDatabase {
    schema_calls: AtomicUsize,
    /// Replayed by `get_table_info`; once drained, the SWIPE schema is returned.
    schemas: Mutex<VecDeque<Result<String>>>,
    executed: Mutex<Vec<String>>,
    results: Mutex<VecDeque<Result<QueryResult>>>,
    closed: AtomicBool,
}

impl MockDatabase {
    fn new(results: Vec<Result<QueryResult>>) -> Arc<Self> {
        Self::with_schemas(vec![], results)
    }

    fn with_schemas(
        schemas: Vec<Result<String>>,
        results: Vec<Result<QueryResult>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            schema_calls: AtomicUsize::new(0),
            schemas: Mutex::new(schemas.into()),
            executed: Mutex::new(Vec::new()),
            results: Mutex::new(results.into()),
            closed: AtomicBool::new(false),
        })
    }

    fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchemaProvider for MockDatabase {
    async fn get_table_info(&self) -> Result<String> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.schemas
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SWIPE_SCHEMA.to_string()))
    }
}

#[async_trait]
impl QueryExecutor for MockDatabase {
    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.executed.lock().unwrap().push(sql.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryResult::default()))
    }
}

#[async_trait]
impl DatabaseHandle for MockDatabase {
    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Completion double replaying scripted replies and recording prompts.
struct ScriptedCompletion {
    replies: Mutex<VecDeque<std::result::Result<String, CompletionError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    fn new(replies: Vec<std::result::Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(CompletionError::Empty))
    }
}

fn settings() -> SessionSettings {
    SessionSettings {
        dialect: Dialect::Oracle.profile(),
        domain_notes: vec![],
        greeting: Some("Hello! Ask me anything about your database.".into()),
        max_rows: 50,
    }
}

fn session(db: &Arc<MockDatabase>, completion: &Arc<ScriptedCompletion>) -> SessionContext {
    SessionContext::new(db.clone(), completion.clone(), settings()).unwrap()
}

fn count_rows(n: i64) -> QueryResult {
    QueryResult::new(vec!["TOTAL_TRANSACTIONS".into()], vec![vec![Some(n.to_string())]])
}

#[tokio::test]
async fn transaction_count_scenario() {
    let db = MockDatabase::new(vec![Ok(count_rows(4821))]);
    let completion = ScriptedCompletion::new(vec![
        Ok("```sql\nSELECT COUNT(*) total_transactions FROM SWIPE_TRANSACTIONS;\n```".into()),
        Ok("There are 4821 transactions available.".into()),
    ]);
    let mut session = session(&db, &completion);

    let outcome = session.ask("How many transactions are available?").await;

    let TurnOutcome::Answered { sql, answer } = outcome else {
        panic!("expected an answer, got {outcome:?}");
    };
    assert!(sql.starts_with("SELECT COUNT(*)"));
    assert!(sql.ends_with("FROM SWIPE_TRANSACTIONS"));
    assert!(answer.contains("4821"));
    assert_eq!(db.executed(), vec![sql.clone()]);

    let prompts = completion.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("<SCHEMA>CREATE TABLE SWIPE_TRANSACTIONS"));
    assert!(prompts[1].contains("SQL Response: TOTAL_TRANSACTIONS\n4821"));
    assert!(prompts[1].contains(&format!("<SQL>{sql}</SQL>")));
}

#[tokio::test]
async fn regular_turn_reads_schema_twice_and_appends_two_turns() {
    let db = MockDatabase::new(vec![Ok(count_rows(3)), Ok(count_rows(5))]);
    let completion = ScriptedCompletion::new(vec![
        Ok("SELECT COUNT(*) FROM SWIPE_TERMINALS WHERE STATUS = 1".into()),
        Ok("3 terminals are active.".into()),
        Ok("SELECT COUNT(*) FROM SWIPE_TERMINALS WHERE STATUS = 4".into()),
        Ok("5 terminals are inactive.".into()),
    ]);
    let mut session = session(&db, &completion);
    let before = session.conversation().len();

    session.ask("How many terminals are active?").await;
    assert_eq!(db.schema_calls(), 2);
    assert_eq!(session.conversation().len(), before + 2);

    session.ask("And inactive?").await;
    assert_eq!(db.schema_calls(), 4);
    assert_eq!(session.conversation().len(), before + 4);

    let turns = session.conversation().turns();
    assert_eq!(turns[before].role(), Role::User);
    assert_eq!(turns[before].text(), "How many terminals are active?");
    assert_eq!(turns[before + 1].role(), Role::Assistant);
    assert_eq!(turns[before + 1].text(), "3 terminals are active.");

    // The follow-up question sees the first exchange as history.
    assert!(completion.prompts()[2].contains("Human: How many terminals are active?"));
}

#[tokio::test]
async fn blank_questions_are_ignored() {
    let db = MockDatabase::new(vec![]);
    let completion = ScriptedCompletion::new(vec![]);
    let mut session = session(&db, &completion);
    let before = session.conversation().clone();

    for question in ["", "   ", "\n\t"] {
        assert_eq!(session.ask(question).await, TurnOutcome::Ignored);
    }

    assert_eq!(session.conversation(), &before);
    assert_eq!(db.schema_calls(), 0);
    assert!(completion.prompts().is_empty());
}

#[tokio::test]
async fn report_request_skips_synthesis_and_execution() {
    let report_text = "**Introduction**\nWe looked at transactions.\n\n\
                       **Key Findings**\n4821 transactions.\n\n\
                       **Trends/Patterns**\nPurchases dominate.\n\n\
                       **Recommendations**\nMonitor refunds.";
    let db = MockDatabase::new(vec![Ok(count_rows(4821))]);
    let completion = ScriptedCompletion::new(vec![
        Ok("SELECT COUNT(*) FROM SWIPE_TRANSACTIONS".into()),
        Ok("There are 4821 transactions.".into()),
        Ok(report_text.into()),
    ]);
    let mut session = session(&db, &completion);
    session.ask("How many transactions are available?").await;
    let schema_calls = db.schema_calls();
    let executed = db.executed().len();

    let outcome = session.ask("Please Generate Report").await;

    let TurnOutcome::Report { report } = outcome else {
        panic!("expected a report, got {outcome:?}");
    };
    assert!(missing_report_sections(&report).is_empty());
    assert_eq!(db.schema_calls(), schema_calls);
    assert_eq!(db.executed().len(), executed);

    let prompts = completion.prompts();
    assert_eq!(prompts.len(), 3);
    let report_prompt = &prompts[2];
    assert!(report_prompt.contains("AI: There are 4821 transactions."));
    assert!(!report_prompt.contains("<SCHEMA>"));
    assert!(!report_prompt.contains("SQL Query:"));

    let last = session.conversation().last().unwrap();
    assert_eq!(last.role(), Role::Assistant);
    assert_eq!(last.text(), report);
}

#[tokio::test]
async fn execution_failure_is_explained_not_fatal() {
    let db = MockDatabase::new(vec![Err(SqlChatError::execution(
        "ORA-00942: table or view does not exist",
    ))]);
    let completion = ScriptedCompletion::new(vec![
        Ok("SELECT COUNT(*) FROM SWIPE_TRANSACTION".into()),
        Ok("Here is a summary of your data.".into()),
    ]);
    let mut session = session(&db, &completion);

    let outcome = session.ask("How many transactions are available?").await;

    let TurnOutcome::Answered { answer, .. } = outcome else {
        panic!("execution failure must still produce an answer, got {outcome:?}");
    };
    assert!(answer.to_lowercase().contains("failed"));
    assert!(answer.contains("ORA-00942"));
    assert_eq!(db.schema_calls(), 2);
    assert!(completion.prompts()[1]
        .contains("SQL Response: Query failed: ORA-00942: table or view does not exist"));
}

#[tokio::test]
async fn synthesis_failure_records_notice_and_runs_nothing() {
    let db = MockDatabase::new(vec![]);
    let completion = ScriptedCompletion::new(vec![Err(CompletionError::Process {
        status_code: Some(503),
        message: "overloaded".into(),
        is_retryable: true,
        retry_after: None,
    })]);
    let mut session = session(&db, &completion);
    let before = session.conversation().len();

    let outcome = session.ask("How many transactions are available?").await;

    let TurnOutcome::Failed { notice } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(notice.contains("overloaded"));
    assert!(db.executed().is_empty());
    assert_eq!(completion.prompts().len(), 1);
    assert_eq!(session.conversation().len(), before + 2);
    assert_eq!(session.conversation().last().unwrap().text(), notice);
}

#[tokio::test]
async fn response_failure_is_a_generic_notice() {
    let db = MockDatabase::new(vec![Ok(count_rows(1))]);
    let completion = ScriptedCompletion::new(vec![
        Ok("SELECT COUNT(*) FROM SWIPE_TRANSACTIONS".into()),
        Err(CompletionError::Other("connection reset".into())),
    ]);
    let mut session = session(&db, &completion);

    let outcome = session.ask("How many transactions are available?").await;

    let TurnOutcome::Failed { notice } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(!notice.contains("connection reset"));
    assert_eq!(db.executed().len(), 1);
}

#[tokio::test]
async fn repeated_answers_are_never_empty() {
    let db = MockDatabase::new(vec![Ok(count_rows(7)), Ok(count_rows(7))]);
    let completion = ScriptedCompletion::new(vec![
        Ok("SELECT COUNT(*) FROM SWIPE_TRANSACTIONS".into()),
        Ok("Seven.".into()),
        Ok("SELECT COUNT(*) FROM SWIPE_TRANSACTIONS".into()),
        Ok("There are 7 of them.".into()),
    ]);
    let mut session = session(&db, &completion);

    for _ in 0..2 {
        let outcome = session.ask("How many transactions are available?").await;
        let text = outcome.assistant_text().unwrap();
        assert!(!text.trim().is_empty());
    }
}

#[tokio::test]
async fn reset_keeps_only_greeting_and_close_releases_database() {
    let db = MockDatabase::new(vec![Ok(count_rows(1))]);
    let completion = ScriptedCompletion::new(vec![
        Ok("SELECT 1 FROM DUAL".into()),
        Ok("One.".into()),
    ]);
    let mut session = session(&db, &completion);
    session.ask("ping?").await;
    assert_eq!(session.conversation().len(), 3);

    session.reset();
    assert_eq!(session.conversation().len(), 1);
    assert_eq!(session.conversation().turns()[0].role(), Role::Assistant);

    session.close().await;
    assert!(db.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn orchestrator_returns_to_idle() {
    use sqlchat_application::{Orchestrator, PromptTemplates, QuerySynthesizer, ResponseSynthesizer};
    use sqlchat_core::Conversation;

    let db = MockDatabase::new(vec![Ok(count_rows(2))]);
    let completion = ScriptedCompletion::new(vec![
        Ok("SELECT 2".into()),
        Ok("Two.".into()),
    ]);
    let templates = Arc::new(PromptTemplates::new(Dialect::Postgres.profile(), vec![]).unwrap());
    let mut orchestrator = Orchestrator::new(
        db.clone(),
        db.clone(),
        QuerySynthesizer::new(completion.clone(), templates.clone()),
        ResponseSynthesizer::new(completion.clone(), templates, 10),
    );
    let mut conversation = Conversation::new();

    orchestrator.handle(&mut conversation, "two?").await;

    assert_eq!(orchestrator.state(), TurnState::Idle);
    assert_eq!(conversation.len(), 2);
}

#[tokio::test]
async fn schema_failure_before_synthesis_aborts_the_turn() {
    let db = MockDatabase::with_schemas(
        vec![Err(SqlChatError::connection("server closed the connection"))],
        vec![],
    );
    let completion = ScriptedCompletion::new(vec![]);
    let mut session = session(&db, &completion);
    let before = session.conversation().len();

    let outcome = session.ask("How many transactions are available?").await;

    let TurnOutcome::Failed { notice } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(notice.contains("server closed the connection"));
    assert_eq!(db.schema_calls(), 1);
    assert!(db.executed().is_empty());
    assert!(completion.prompts().is_empty());
    assert_eq!(session.conversation().len(), before + 2);
}

#[tokio::test]
async fn schema_failure_before_response_still_answers() {
    let db = MockDatabase::with_schemas(
        vec![
            Ok(SWIPE_SCHEMA.to_string()),
            Err(SqlChatError::connection("server closed the connection")),
        ],
        vec![Ok(count_rows(4821))],
    );
    let completion = ScriptedCompletion::new(vec![
        Ok("SELECT COUNT(*) FROM SWIPE_TRANSACTIONS".into()),
        Ok("There are 4821 transactions available.".into()),
    ]);
    let mut session = session(&db, &completion);

    let outcome = session.ask("How many transactions are available?").await;

    let TurnOutcome::Answered { answer, .. } = outcome else {
        panic!("expected an answer, got {outcome:?}");
    };
    assert!(answer.contains("4821"));
    assert_eq!(db.schema_calls(), 2);
    let response_prompt = &completion.prompts()[1];
    assert!(response_prompt.contains("(schema unavailable:"));
    assert!(response_prompt.contains("SQL Response: TOTAL_TRANSACTIONS\n4821"));
}

#[tokio::test]
async fn report_failure_is_a_generic_notice() {
    let db = MockDatabase::new(vec![]);
    let completion = ScriptedCompletion::new(vec![Err(CompletionError::Other(
        "connection reset".into(),
    ))]);
    let mut session = session(&db, &completion);
    let before = session.conversation().len();

    let outcome = session.ask("generate report").await;

    assert_eq!(
        outcome,
        TurnOutcome::Failed {
            notice: RESPONSE_FAILURE_NOTICE.to_string()
        }
    );
    assert_eq!(db.schema_calls(), 0);
    assert!(db.executed().is_empty());
    assert_eq!(session.conversation().len(), before + 2);
}

#[tokio::test]
async fn chained_statements_are_never_executed() {
    let db = MockDatabase::new(vec![]);
    let completion = ScriptedCompletion::new(vec![Ok(
        "SELECT COUNT(*) FROM SWIPE_TRANSACTIONS; COMMIT; DELETE FROM SWIPE_TRANSACTIONS".into(),
    )]);
    let mut session = session(&db, &completion);

    let outcome = session.ask("How many transactions are available?").await;

    assert!(matches!(outcome, TurnOutcome::Failed { .. }));
    assert!(db.executed().is_empty());
    assert_eq!(completion.prompts().len(), 1);
}
