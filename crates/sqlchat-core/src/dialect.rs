//! SQL dialect rules fed into the synthesis prompt.
//!
//! Dialect correctness cannot be checked statically here; it is expressed
//! as rules and worked examples that the prompt contract enumerates, so the
//! synthesizer is told exactly which date and null-handling idioms it may use.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SqlChatError;

/// A question paired with the SQL that answers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub question: String,
    pub sql: String,
}

impl FewShotExample {
    pub fn new(question: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            sql: sql.into(),
        }
    }
}

/// Which preset to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Oracle,
    Postgres,
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::Postgres
    }
}

impl FromStr for Dialect {
    type Err = SqlChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oracle" => Ok(Dialect::Oracle),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(SqlChatError::config(format!("unknown SQL dialect '{other}'"))),
        }
    }
}

impl Dialect {
    pub fn profile(self) -> DialectProfile {
        match self {
            Dialect::Oracle => DialectProfile::oracle(),
            Dialect::Postgres => DialectProfile::postgres(),
        }
    }
}

/// Rules and examples describing one SQL dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectProfile {
    /// Human-readable dialect name used in prompts, e.g. "Oracle SQL".
    pub name: String,
    pub rules: Vec<String>,
    pub examples: Vec<FewShotExample>,
}

impl DialectProfile {
    pub fn oracle() -> Self {
        Self {
            name: "Oracle SQL".to_string(),
            rules: vec![
                "For differences between DATE columns use (DATE2 - DATE1) * 24 * 60 * 60 to get seconds.".into(),
                "For differences between TIMESTAMP columns sum EXTRACT(SECOND FROM (T2 - T1)) + EXTRACT(MINUTE FROM (T2 - T1)) * 60 + EXTRACT(HOUR FROM (T2 - T1)) * 3600 + EXTRACT(DAY FROM (T2 - T1)) * 86400.".into(),
                "Use TO_DATE() and TO_CHAR() for date conversions and formatting.".into(),
                "Use NVL() for null handling instead of COALESCE().".into(),
                "Use TRUNC() for date truncation.".into(),
                "Never use non-Oracle functions such as EXTRACT(EPOCH FROM ...).".into(),
                "Do not use the AS keyword for column aliases.".into(),
                "Use CASE WHEN ... THEN ... END for conditional logic.".into(),
            ],
            examples: vec![
                FewShotExample::new(
                    "How many transactions are available?",
                    "SELECT COUNT(*) total_transactions FROM SWIPE_TRANSACTIONS",
                ),
                FewShotExample::new(
                    "What is the frequently used transaction?",
                    "SELECT TRANSACTION_TYPE, COUNT(*) transaction_count FROM SWIPE_TRANSACTIONS GROUP BY TRANSACTION_TYPE ORDER BY transaction_count DESC",
                ),
                FewShotExample::new(
                    "How many terminals are active?",
                    "SELECT COUNT(*) active_terminals FROM SWIPE_TERMINALS WHERE STATUS = 1",
                ),
                FewShotExample::new(
                    "What is the average time per transaction?",
                    "SELECT AVG(EXTRACT(SECOND FROM (TRANS_TIME - DATE_CREATED)) + EXTRACT(MINUTE FROM (TRANS_TIME - DATE_CREATED)) * 60 + EXTRACT(HOUR FROM (TRANS_TIME - DATE_CREATED)) * 3600 + EXTRACT(DAY FROM (TRANS_TIME - DATE_CREATED)) * 86400) average_time_per_transaction FROM SWIPE_TRANSACTIONS",
                ),
            ],
        }
    }

    pub fn postgres() -> Self {
        Self {
            name: "PostgreSQL".to_string(),
            rules: vec![
                "For differences between timestamps use EXTRACT(EPOCH FROM (T2 - T1)) to get seconds.".into(),
                "Use AGE() when a calendar interval is needed.".into(),
                "Use TO_DATE() and TO_CHAR() for date conversions and formatting.".into(),
                "Use COALESCE() for null handling.".into(),
                "Use DATE_TRUNC() for date truncation.".into(),
                "Use CASE WHEN ... THEN ... END for conditional logic.".into(),
            ],
            examples: vec![
                FewShotExample::new(
                    "How many transactions are available?",
                    "SELECT COUNT(*) AS total_transactions FROM SWIPE_TRANSACTIONS",
                ),
                FewShotExample::new(
                    "What is the frequently used transaction?",
                    "SELECT TRANSACTION_TYPE, COUNT(*) AS transaction_count FROM SWIPE_TRANSACTIONS GROUP BY TRANSACTION_TYPE ORDER BY transaction_count DESC",
                ),
                FewShotExample::new(
                    "How many terminals are active?",
                    "SELECT COUNT(*) AS active_terminals FROM SWIPE_TERMINALS WHERE STATUS = 1",
                ),
                FewShotExample::new(
                    "What is the average time per transaction?",
                    "SELECT AVG(EXTRACT(EPOCH FROM (TRANS_TIME - DATE_CREATED))) AS average_time_per_transaction FROM SWIPE_TRANSACTIONS",
                ),
            ],
        }
    }
}
