pub mod completion;
pub mod config;
pub mod connection;
pub mod conversation;
pub mod database;
pub mod dialect;
pub mod error;
pub mod sql;
pub mod state;

// Re-export common types
pub use completion::{CompletionError, CompletionService};
pub use connection::ConnectionDescriptor;
pub use conversation::{Conversation, Role, Turn};
pub use database::{DatabaseHandle, ExecutionOutcome, QueryExecutor, QueryResult, SchemaProvider};
pub use dialect::{Dialect, DialectProfile, FewShotExample};
pub use error::{Result, SqlChatError};
pub use sql::is_single_statement;
pub use state::TurnState;
