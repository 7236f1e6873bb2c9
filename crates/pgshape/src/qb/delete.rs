//! DELETE query builder.

use crate::condition::ConditionSet;
use crate::error::{Action, DbError, DbResult};
use crate::ident::Ident;
use crate::qb::traits::{MutationQb, Precondition, SqlQb, check_probe_conditions, write_returning};
use crate::shape::RowShape;
use crate::statement::{Binder, BuiltStatement};
use crate::value::Value;

/// DELETE query builder.
///
/// A DELETE without WHERE conditions cannot be built.
#[derive(Clone, Debug, Default)]
pub struct DeleteQb {
    /// Table name
    table: Option<String>,
    /// WHERE conditions (mandatory)
    conditions: ConditionSet,
    /// RETURNING columns
    returning_cols: Vec<String>,
    /// Probe that must find a row
    check: Option<ConditionSet>,
    /// Check existence with the final WHERE conditions
    check_where: bool,
}

impl DeleteQb {
    /// Create a new DELETE query builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target table.
    pub fn from_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add WHERE: column = value
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(column, value);
        self
    }

    /// Add every condition of a set to WHERE.
    pub fn where_all(mut self, conditions: &ConditionSet) -> Self {
        for (column, value) in conditions.iter() {
            self.conditions.insert(column, value.clone());
        }
        self
    }

    /// Set RETURNING columns.
    pub fn returning(mut self, cols: &[&str]) -> Self {
        self.returning_cols = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Return every field of row shape `S`.
    pub fn returning_shape<S: RowShape>(mut self) -> Self {
        self.returning_cols = S::FIELDS.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Abort with [`DbError::NotFound`] unless a row matching `conditions` exists.
    pub fn check_exists(mut self, conditions: ConditionSet) -> Self {
        self.check = Some(conditions);
        self.check_where = false;
        self
    }

    /// Require a row matching the WHERE conditions, including any added later.
    pub fn check_exists_where(mut self) -> Self {
        self.check_where = true;
        self.check = None;
        self
    }
}

impl SqlQb for DeleteQb {
    fn build(&self) -> DbResult<BuiltStatement> {
        let table = match self.table.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => return Err(DbError::config("Table name must be provided")),
        };
        self.conditions.require_non_empty("WHERE")?;
        check_probe_conditions(self.check.as_ref())?;

        let mut binder = Binder::new();
        let mut sql = String::from("DELETE FROM ");
        Ident::new(table)?.write_sql(&mut sql);
        sql.push_str(" WHERE ");
        self.conditions
            .write_predicates(&mut sql, &mut binder, "", None)?;
        write_returning(&mut sql, &self.returning_cols)?;
        Ok(binder.finish(sql))
    }
}

impl MutationQb for DeleteQb {
    const ACTION: Action = Action::Delete;

    fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    fn existence_check(&self) -> Option<(&ConditionSet, Precondition)> {
        if self.check_where {
            return Some((&self.conditions, Precondition::Present));
        }
        self.check.as_ref().map(|c| (c, Precondition::Present))
    }

    fn has_returning(&self) -> bool {
        !self.returning_cols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_sql() {
        let stmt = DeleteQb::new()
            .from_table("risk_ratings")
            .eq("risk_id", "r1")
            .eq("rating_id", 7i64)
            .returning(&["risk_id"])
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            r#"DELETE FROM "risk_ratings" WHERE "risk_id" = $1 AND "rating_id" = $2 RETURNING "risk_id""#
        );
        assert_eq!(stmt.param("rating_id"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_delete_requires_where() {
        let err = DeleteQb::new().from_table("risks").build().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_delete_requires_table() {
        let err = DeleteQb::new().eq("id", "r1").build().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_check_exists_where_sees_later_conditions() {
        let qb = DeleteQb::new()
            .from_table("risks")
            .check_exists_where()
            .eq("id", "r1")
            .eq("tenant", "t2");
        qb.build().unwrap();
        let (check, _) = qb.existence_check().unwrap();
        assert_eq!(check.len(), 2);
        assert_eq!(check.get("tenant"), Some(&Value::Text("t2".into())));
    }

    #[test]
    fn test_check_exists_where_reuses_conditions() {
        let qb = DeleteQb::new()
            .from_table("risks")
            .eq("id", "r1")
            .check_exists_where();
        let (check, precondition) = qb.existence_check().unwrap();
        assert_eq!(check.get("id"), Some(&Value::Text("r1".into())));
        assert_eq!(precondition, Precondition::Present);
    }
}
