//! Error types for pgshape

use std::fmt;
use thiserror::Error;

/// Result type alias for pgshape operations
pub type DbResult<T> = Result<T, DbError>;

/// The statement a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Existence probe run ahead of a mutation
    Probe,
    Read,
    Insert,
    Update,
    Delete,
    /// Caller-provided statement
    Raw,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::Probe => "check existence in",
            Action::Read => "read from",
            Action::Insert => "insert record in",
            Action::Update => "update record in",
            Action::Delete => "delete record from",
            Action::Raw => "execute raw statement on",
        };
        f.write_str(verb)
    }
}

/// Low-level failure reported by a [`Connection`](crate::Connection).
///
/// Never escapes the builders: the execution layer rewraps it as
/// [`DbError::Execution`] (or [`DbError::Duplicate`] for unique violations).
#[derive(Debug, Error)]
pub enum DriverError {
    /// Error raised by tokio-postgres
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    /// Connection checkout failed
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A result column could not be decoded into a [`Value`](crate::Value)
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Server rejection reported by a connection other than tokio-postgres
    #[error("{message} (SQLSTATE {code})")]
    Server { code: String, message: String },

    /// Any other connection-level failure
    #[error("{0}")]
    Other(String),
}

impl DriverError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// A server rejection carrying a SQLSTATE code.
    pub fn server(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Server {
            code: code.into(),
            message: message.into(),
        }
    }

    /// SQLSTATE code reported by the server, if any.
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Postgres(err) => err.as_db_error().map(|db| db.code().code()),
            Self::Server { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether the server rejected the statement with a unique violation.
    pub fn is_unique_violation(&self) -> bool {
        self.sqlstate() == Some("23505")
    }
}

/// Error types for builder operations
#[derive(Debug, Error)]
pub enum DbError {
    /// A required builder parameter is missing or invalid; no I/O was attempted
    #[error("Configuration error: {0}")]
    Config(String),

    /// The insert existence check (or a unique constraint) matched an existing row
    #[error("Record already exists in table {}", display_table(.table))]
    Duplicate { table: String },

    /// The update/delete existence check found no matching row
    #[error("No matching record found in table {} for the given conditions", display_table(.table))]
    NotFound { table: String },

    /// The store rejected or failed to run the statement
    #[error("Failed to {action} table {}: {source}", display_table(.table))]
    Execution {
        action: Action,
        table: String,
        #[source]
        source: DriverError,
    },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Connection could not be checked out of the pool
    #[error("Pool error: {0}")]
    Pool(String),

    /// BEGIN, COMMIT or ROLLBACK failed
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl DbError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a transaction error from any displayable failure
    pub fn transaction(err: impl fmt::Display) -> Self {
        Self::Transaction(err.to_string())
    }

    pub fn duplicate(table: impl Into<String>) -> Self {
        Self::Duplicate {
            table: table.into(),
        }
    }

    pub fn not_found(table: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
        }
    }

    /// Wrap a driver failure, promoting unique violations on inserts to [`DbError::Duplicate`].
    pub fn execution(action: Action, table: impl Into<String>, source: DriverError) -> Self {
        let table = table.into();
        let source = match source {
            DriverError::Decode { column, message } => return Self::Decode { column, message },
            other => other,
        };
        if action == Action::Insert && source.is_unique_violation() {
            return Self::Duplicate { table };
        }
        Self::Execution {
            action,
            table,
            source,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }

    /// Whether a caller-level retry of the same call is safe and could succeed.
    ///
    /// Only failed reads and existence checks qualify. A failed write may or
    /// may not have been applied, so retrying it is left to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Execution {
                action: Action::Read | Action::Probe,
                ..
            }
        )
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

/// Render a table name for messages: `risk_registers` -> `Risk Registers`.
pub fn display_table(table: &str) -> String {
    table
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_table_title_cases_words() {
        assert_eq!(display_table("risk_registers"), "Risk Registers");
        assert_eq!(display_table("risks"), "Risks");
        assert_eq!(display_table("RMP"), "Rmp");
    }

    #[test]
    fn duplicate_message_names_table() {
        let err = DbError::duplicate("risk_ratings");
        assert_eq!(err.to_string(), "Record already exists in table Risk Ratings");
        assert!(err.is_duplicate());
        assert!(!err.is_retryable());
    }

    #[test]
    fn execution_keeps_cause() {
        let err = DbError::execution(Action::Update, "users", DriverError::other("connection reset"));
        assert!(err.is_execution());
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Failed to update record in table Users: connection reset"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn only_failed_reads_are_retryable() {
        let read = DbError::execution(Action::Read, "risks", DriverError::other("timeout"));
        let probe = DbError::execution(Action::Probe, "risks", DriverError::other("timeout"));
        let insert = DbError::execution(Action::Insert, "risks", DriverError::other("timeout"));
        let raw = DbError::execution(Action::Raw, "risks", DriverError::other("timeout"));
        assert!(read.is_retryable());
        assert!(probe.is_retryable());
        assert!(!insert.is_retryable());
        assert!(!raw.is_retryable());
    }

    #[test]
    fn unique_violation_on_insert_is_duplicate() {
        let source = DriverError::server("23505", "duplicate key value violates unique constraint");
        assert_eq!(source.sqlstate(), Some("23505"));
        assert!(source.is_unique_violation());

        let err = DbError::execution(Action::Insert, "risk_registers", source);
        assert!(err.is_duplicate());
        assert_eq!(err.to_string(), "Record already exists in table Risk Registers");
    }

    #[test]
    fn unique_violation_on_update_stays_execution() {
        let source = DriverError::server("23505", "duplicate key value");
        let err = DbError::execution(Action::Update, "risks", source);
        assert!(err.is_execution());
        assert!(err.to_string().ends_with("duplicate key value (SQLSTATE 23505)"));
    }

    #[test]
    fn undecodable_column_is_decode_error() {
        let source = DriverError::Decode {
            column: "score".into(),
            message: "unsupported column type numeric".into(),
        };
        let err = DbError::execution(Action::Read, "risk_ratings", source);
        match err {
            DbError::Decode { column, message } => {
                assert_eq!(column, "score");
                assert!(message.contains("numeric"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_postgres_driver_error_has_no_sqlstate() {
        let err = DriverError::other("boom");
        assert_eq!(err.sqlstate(), None);
        assert!(!err.is_unique_violation());
    }
}
