//! Connection trait consumed by the builders.

use crate::error::DriverError;
use crate::record::Record;
use crate::statement::BuiltStatement;
use tokio_postgres::Row;

/// An opaque database handle: run a built statement, get rows or a row count back.
///
/// Implemented for plain clients and transactions alike, so a caller can run a
/// builder's probe and main statement inside one transaction simply by passing
/// the transaction. Implementations report raw driver failures; the execution
/// layer is responsible for turning them into [`DbError`](crate::DbError)s.
pub trait Connection: Send + Sync {
    /// Execute a statement and return all rows.
    fn query(
        &self,
        stmt: &BuiltStatement,
    ) -> impl std::future::Future<Output = Result<Vec<Record>, DriverError>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        stmt: &BuiltStatement,
    ) -> impl std::future::Future<Output = Result<u64, DriverError>> + Send;
}

fn to_records(rows: &[Row]) -> Result<Vec<Record>, DriverError> {
    rows.iter()
        .map(|row| {
            Record::from_row(row).map_err(|e| match e {
                crate::DbError::Decode { column, message } => {
                    DriverError::Decode { column, message }
                }
                other => DriverError::other(other.to_string()),
            })
        })
        .collect()
}

impl Connection for tokio_postgres::Client {
    async fn query(&self, stmt: &BuiltStatement) -> Result<Vec<Record>, DriverError> {
        let rows = tokio_postgres::Client::query(self, stmt.sql(), &stmt.params_ref()).await?;
        to_records(&rows)
    }

    async fn execute(&self, stmt: &BuiltStatement) -> Result<u64, DriverError> {
        Ok(tokio_postgres::Client::execute(self, stmt.sql(), &stmt.params_ref()).await?)
    }
}

impl Connection for tokio_postgres::Transaction<'_> {
    async fn query(&self, stmt: &BuiltStatement) -> Result<Vec<Record>, DriverError> {
        let rows =
            tokio_postgres::Transaction::query(self, stmt.sql(), &stmt.params_ref()).await?;
        to_records(&rows)
    }

    async fn execute(&self, stmt: &BuiltStatement) -> Result<u64, DriverError> {
        Ok(tokio_postgres::Transaction::execute(self, stmt.sql(), &stmt.params_ref()).await?)
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Client {
    async fn query(&self, stmt: &BuiltStatement) -> Result<Vec<Record>, DriverError> {
        // Delegate to the deref target (ClientWrapper -> tokio_postgres::Client).
        let client: &tokio_postgres::Client = self;
        Connection::query(client, stmt).await
    }

    async fn execute(&self, stmt: &BuiltStatement) -> Result<u64, DriverError> {
        let client: &tokio_postgres::Client = self;
        Connection::execute(client, stmt).await
    }
}

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Transaction<'_> {
    async fn query(&self, stmt: &BuiltStatement) -> Result<Vec<Record>, DriverError> {
        let tx: &tokio_postgres::Transaction<'_> = self;
        Connection::query(tx, stmt).await
    }

    async fn execute(&self, stmt: &BuiltStatement) -> Result<u64, DriverError> {
        let tx: &tokio_postgres::Transaction<'_> = self;
        Connection::execute(tx, stmt).await
    }
}
