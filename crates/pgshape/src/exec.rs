//! Execution layer: runs built statements and normalizes failures.
//!
//! Every round trip the builders make goes through here, so this is the one
//! place where driver failures become [`DbError`]s and where statements are
//! logged. Values are never logged, only the SQL text and parameter count.

use crate::client::Connection;
use crate::condition::ConditionSet;
use crate::error::{Action, DbError, DbResult};
use crate::ident::Ident;
use crate::record::Record;
use crate::statement::{Binder, BuiltStatement};

#[cfg(feature = "tracing")]
fn log_statement(action: Action, table: &str, stmt: &BuiltStatement) {
    tracing::debug!(
        target: "pgshape.sql",
        action = %action,
        table,
        param_count = stmt.param_count(),
        sql = %stmt.sql(),
    );
}

#[cfg(not(feature = "tracing"))]
fn log_statement(_action: Action, _table: &str, _stmt: &BuiltStatement) {}

fn wrap(action: Action, table: &str, err: crate::error::DriverError) -> DbError {
    #[cfg(feature = "tracing")]
    tracing::warn!(target: "pgshape.sql", action = %action, table, error = tracing::field::display(&err), "statement failed");
    DbError::execution(action, table, err)
}

/// Run a statement and return every row (possibly none).
pub async fn fetch_all(
    conn: &impl Connection,
    action: Action,
    table: &str,
    stmt: &BuiltStatement,
) -> DbResult<Vec<Record>> {
    log_statement(action, table, stmt);
    conn.query(stmt).await.map_err(|e| wrap(action, table, e))
}

/// Run a statement and return the first row, or `None` when there is none.
pub async fn fetch_opt(
    conn: &impl Connection,
    action: Action,
    table: &str,
    stmt: &BuiltStatement,
) -> DbResult<Option<Record>> {
    let rows = fetch_all(conn, action, table, stmt).await?;
    Ok(rows.into_iter().next())
}

/// Run a statement and return the affected row count.
pub async fn execute(
    conn: &impl Connection,
    action: Action,
    table: &str,
    stmt: &BuiltStatement,
) -> DbResult<u64> {
    log_statement(action, table, stmt);
    conn.execute(stmt).await.map_err(|e| wrap(action, table, e))
}

/// Build `SELECT 1 FROM table WHERE c1 = $1 AND ... LIMIT 1`.
pub fn build_probe(table: &str, conditions: &ConditionSet) -> DbResult<BuiltStatement> {
    conditions.require_non_empty("existence check")?;
    let mut binder = Binder::new();
    let mut sql = String::from("SELECT 1 FROM ");
    Ident::new(table)?.write_sql(&mut sql);
    sql.push_str(" WHERE ");
    conditions.write_predicates(&mut sql, &mut binder, "", None)?;
    sql.push_str(" LIMIT 1");
    Ok(binder.finish(sql))
}

/// Whether at least one row of `table` matches `conditions`.
pub async fn record_exists(
    conn: &impl Connection,
    table: &str,
    conditions: &ConditionSet,
) -> DbResult<bool> {
    let stmt = build_probe(table, conditions)?;
    let found = fetch_opt(conn, Action::Probe, table, &stmt).await?.is_some();
    #[cfg(feature = "tracing")]
    tracing::debug!(target: "pgshape.sql", table, found, "existence probe");
    Ok(found)
}

/// Pick the mutation result: the first returned row when RETURNING was requested.
pub(crate) async fn run_returning(
    conn: &impl Connection,
    action: Action,
    table: &str,
    stmt: &BuiltStatement,
    returning: bool,
) -> DbResult<Option<Record>> {
    if returning {
        fetch_opt(conn, action, table, stmt).await
    } else {
        execute(conn, action, table, stmt).await?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn probe_sql() {
        let conds = ConditionSet::new().eq("email", "a@example.com").eq("active", true);
        let stmt = build_probe("users", &conds).unwrap();
        assert_eq!(
            stmt.sql(),
            r#"SELECT 1 FROM "users" WHERE "email" = $1 AND "active" = $2 LIMIT 1"#
        );
        assert_eq!(stmt.param("active"), Some(&Value::Bool(true)));
    }

    #[test]
    fn probe_requires_conditions() {
        assert!(build_probe("users", &ConditionSet::new()).unwrap_err().is_config());
    }
}
