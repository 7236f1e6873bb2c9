//! Trait definitions for query builders.

use crate::client::Connection;
use crate::condition::ConditionSet;
use crate::error::{Action, DbError, DbResult};
use crate::exec;
use crate::record::Record;
use crate::statement::BuiltStatement;

/// Base trait for all query builders.
///
/// `build` is pure: it validates the configuration, composes the SQL text and
/// binds every value, without touching the database. Calling it twice on an
/// unchanged builder yields identical statements.
pub trait SqlQb: Sync {
    /// Compose the statement.
    fn build(&self) -> DbResult<BuiltStatement>;

    /// Debug helper to get the SQL string.
    fn to_sql(&self) -> DbResult<String> {
        Ok(self.build()?.sql().to_string())
    }
}

/// What an existence probe must find for a mutation to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// No matching row may exist (insert); otherwise [`DbError::Duplicate`].
    Absent,
    /// A matching row must exist (update/delete); otherwise [`DbError::NotFound`].
    Present,
}

/// Trait for mutation builders (INSERT/UPDATE/DELETE).
///
/// The provided [`MutationQb::execute`] implements the probe-then-act sequence:
///
/// 1. raw mode: run the caller's statement as-is, under the builder's action, and stop;
/// 2. build the main statement, so configuration errors surface before any I/O;
/// 3. if an existence check is configured, run `SELECT 1 ... LIMIT 1` and abort
///    with `Duplicate`/`NotFound` when the precondition fails;
/// 4. run the statement and return the first RETURNING row, if requested.
///
/// Steps 3 and 4 are separate round trips. Unless the connection passed in is
/// a transaction (with an isolation level that prevents it), a concurrent
/// writer can slip between them. For inserts prefer a unique constraint,
/// optionally with `on_conflict_do_nothing`, which the store enforces atomically.
pub trait MutationQb: SqlQb {
    /// Which statement kind this builder produces.
    const ACTION: Action;

    /// Target table, if configured.
    fn table_name(&self) -> Option<&str>;

    /// Existence check to run before the statement.
    fn existence_check(&self) -> Option<(&ConditionSet, Precondition)>;

    /// Whether RETURNING columns were requested.
    fn has_returning(&self) -> bool;

    /// Caller-provided statement replacing the built one.
    fn raw_statement(&self) -> Option<&BuiltStatement> {
        None
    }

    /// Whether zero affected rows means the row already existed
    /// (`ON CONFLICT DO NOTHING`).
    fn zero_rows_is_duplicate(&self) -> bool {
        false
    }

    /// Execute and return the first RETURNING row, if any was requested.
    fn execute(
        &self,
        conn: &impl Connection,
    ) -> impl std::future::Future<Output = DbResult<Option<Record>>> + Send {
        async move {
            if let Some(raw) = self.raw_statement() {
                let table = self.table_name().unwrap_or("raw");
                // Raw statements run under the builder's action.
                return exec::run_returning(conn, Self::ACTION, table, raw, self.has_returning())
                    .await;
            }

            let stmt = self.build()?;
            let table = self
                .table_name()
                .ok_or_else(|| DbError::config("Table name must be provided"))?;

            if let Some((conditions, precondition)) = self.existence_check() {
                let exists = exec::record_exists(conn, table, conditions).await?;
                match (precondition, exists) {
                    (Precondition::Absent, true) => return Err(DbError::duplicate(table)),
                    (Precondition::Present, false) => return Err(DbError::not_found(table)),
                    _ => {}
                }
            }

            if !self.zero_rows_is_duplicate() {
                return exec::run_returning(conn, Self::ACTION, table, &stmt, self.has_returning())
                    .await;
            }

            if self.has_returning() {
                exec::fetch_opt(conn, Self::ACTION, table, &stmt)
                    .await?
                    .map(Some)
                    .ok_or_else(|| DbError::duplicate(table))
            } else {
                match exec::execute(conn, Self::ACTION, table, &stmt).await? {
                    0 => Err(DbError::duplicate(table)),
                    _ => Ok(None),
                }
            }
        }
    }
}

/// Validate an optional existence-check set.
pub(crate) fn check_probe_conditions(check: Option<&ConditionSet>) -> DbResult<()> {
    match check {
        Some(conditions) => conditions.require_non_empty("existence check"),
        None => Ok(()),
    }
}

/// Write ` RETURNING "a", "b"` when columns were requested.
pub(crate) fn write_returning(sql: &mut String, returning: &[String]) -> DbResult<()> {
    if returning.is_empty() {
        return Ok(());
    }
    sql.push_str(" RETURNING ");
    crate::ident::write_ident_list(sql, returning.iter().map(String::as_str))
}
