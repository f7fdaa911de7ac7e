//! Database connection descriptor.

use std::fmt;

use crate::error::{Result, SqlChatError};

/// Everything needed to open a database handle.
///
/// Supplied once by the operator. There are no default values: every field
/// must be provided explicitly, and the password is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Database / service to connect to.
    pub service_name: String,
}

impl ConnectionDescriptor {
    /// Builds a descriptor from optional parts, failing with a `Config` error
    /// that names the first missing field.
    pub fn from_parts(
        host: Option<String>,
        port: Option<u16>,
        user: Option<String>,
        password: Option<String>,
        service_name: Option<String>,
    ) -> Result<Self> {
        fn required<T>(value: Option<T>, field: &str) -> Result<T> {
            value.ok_or_else(|| {
                SqlChatError::config(format!("database connection field '{field}' is not set"))
            })
        }

        let descriptor = Self {
            host: required(host, "host")?,
            port: required(port, "port")?,
            user: required(user, "user")?,
            password: required(password, "password")?,
            service_name: required(service_name, "service_name")?,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Rejects blank host, user or service name.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("host", &self.host),
            ("user", &self.user),
            ("service_name", &self.service_name),
        ] {
            if value.trim().is_empty() {
                return Err(SqlChatError::config(format!(
                    "database connection field '{field}' is empty"
                )));
            }
        }
        if self.port == 0 {
            return Err(SqlChatError::config("database port must be non-zero"));
        }
        Ok(())
    }

    /// `user@host:port/service_name`, safe to show and log.
    pub fn display_target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.service_name
        )
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("service_name", &self.service_name)
            .finish()
    }
}
