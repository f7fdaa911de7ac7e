pub mod config_service;
pub mod paths;
pub mod postgres;

pub use config_service::{ConnectionOverrides, load_app_config, load_secrets, resolve_connection};
pub use paths::SqlChatPaths;
pub use postgres::PgDatabase;
