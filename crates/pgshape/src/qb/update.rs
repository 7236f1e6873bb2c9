//! UPDATE query builder.

use crate::condition::ConditionSet;
use crate::error::{Action, DbError, DbResult};
use crate::ident::Ident;
use crate::qb::traits::{MutationQb, Precondition, SqlQb, check_probe_conditions, write_returning};
use crate::shape::{RowShape, ShapeValues};
use crate::statement::{Binder, BuiltStatement};
use crate::value::Value;

/// Parameter-name prefix for SET values.
const SET_NAMESPACE: &str = "set_";
/// Parameter-name prefix for WHERE values.
const WHERE_NAMESPACE: &str = "where_";

/// UPDATE query builder.
///
/// SET values are bound under `set_<column>` and WHERE values under
/// `where_<column>`. The two prefixes never overlap, so no pair of column
/// names can collide, including a SET column literally named `where_id`.
#[derive(Clone, Debug, Default)]
pub struct UpdateQb {
    /// Table name
    table: Option<String>,
    /// SET (column, value) pairs
    data: Option<ShapeValues>,
    /// Set when capturing the row shape failed; reported at build time
    invalid_data: Option<String>,
    /// WHERE conditions (mandatory)
    conditions: ConditionSet,
    /// RETURNING columns
    returning_cols: Vec<String>,
    /// Probe that must find a row
    check: Option<ConditionSet>,
    /// Omit NULL values from SET
    skip_nulls: bool,
    /// Caller-provided statement (raw mode)
    raw: Option<BuiltStatement>,
}

impl UpdateQb {
    /// Create a new UPDATE query builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target table.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// SET every field of a row shape instance.
    pub fn values<S: RowShape>(mut self, row: &S) -> Self {
        match row.shape_values() {
            Ok(data) => {
                self.data = Some(data);
                self.invalid_data = None;
            }
            Err(err) => {
                self.data = None;
                self.invalid_data = Some(err.to_string());
            }
        }
        self
    }

    /// SET pre-captured (column, value) pairs.
    pub fn values_raw(mut self, data: ShapeValues) -> Self {
        self.data = Some(data);
        self.invalid_data = None;
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
        self
    }

    /// Leave NULL-valued fields out of SET (partial update).
    pub fn skip_nulls(mut self) -> Self {
        self.skip_nulls = true;
        self
    }

    /// Execute this statement instead of building one. No probe is run.
    pub fn raw(mut self, stmt: BuiltStatement) -> Self {
        self.raw = Some(stmt);
        self
    }
}

impl SqlQb for UpdateQb {
    fn build(&self) -> DbResult<BuiltStatement> {
        if let Some(raw) = &self.raw {
            return Ok(raw.clone());
        }

        let table = match self.table.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => return Err(DbError::config("Table name must be provided")),
        };
        if let Some(message) = &self.invalid_data {
            return Err(DbError::config(message.clone()));
        }
        let data = match &self.data {
            Some(data) if !data.is_empty() => data,
            _ => return Err(DbError::config("Data must be provided")),
        };
        self.conditions.require_non_empty("WHERE")?;
        check_probe_conditions(self.check.as_ref())?;

        let mut binder = Binder::new();
        let mut sql = String::from("UPDATE ");
        Ident::new(table)?.write_sql(&mut sql);
        sql.push_str(" SET ");

        let mut written = 0;
        for (column, value) in data.iter() {
            if self.skip_nulls && value.is_null() {
                continue;
            }
            if written > 0 {
                sql.push_str(", ");
            }
            Ident::new(column)?.write_sql(&mut sql);
            sql.push_str(" = ");
            let name = format!("{SET_NAMESPACE}{column}");
            sql.push_str(&binder.bind(name, value.clone())?);
            written += 1;
        }
        if written == 0 {
            return Err(DbError::config("No fields to update"));
        }

        sql.push_str(" WHERE ");
        self.conditions
            .write_predicates(&mut sql, &mut binder, WHERE_NAMESPACE, None)?;

        write_returning(&mut sql, &self.returning_cols)?;
        Ok(binder.finish(sql))
    }
}

impl MutationQb for UpdateQb {
    const ACTION: Action = Action::Update;

    fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    fn existence_check(&self) -> Option<(&ConditionSet, Precondition)> {
        self.check.as_ref().map(|c| (c, Precondition::Present))
    }

    fn has_returning(&self) -> bool {
        !self.returning_cols.is_empty()
    }

    fn raw_statement(&self) -> Option<&BuiltStatement> {
        self.raw.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row_shape;

    struct UpdateRisk {
        name: String,
        status: Option<String>,
    }

    row_shape!(UpdateRisk { name, status });

    fn rename() -> UpdateRisk {
        UpdateRisk {
            name: "Phishing".into(),
            status: Some("open".into()),
        }
    }

    #[test]
    fn test_update_sql() {
        let stmt = UpdateQb::new()
            .table("risks")
            .values(&rename())
            .eq("id", "r1")
            .returning(&["id"])
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            r#"UPDATE "risks" SET "name" = $1, "status" = $2 WHERE "id" = $3 RETURNING "id""#
        );
    }

    #[test]
    fn test_set_and_where_on_same_column_do_not_collide() {
        let stmt = UpdateQb::new()
            .table("risks")
            .values(&rename())
            .eq("status", "draft")
            .build()
            .unwrap();
        assert_eq!(stmt.param("set_status"), Some(&Value::Text("open".into())));
        assert_eq!(stmt.param("where_status"), Some(&Value::Text("draft".into())));
        assert!(stmt.sql().ends_with(r#"WHERE "status" = $3"#));
    }

    #[test]
    fn test_set_column_named_like_where_param() {
        let data = ShapeValues::new().with("where_id", "legacy-7").unwrap();
        let stmt = UpdateQb::new()
            .table("risks")
            .values_raw(data)
            .eq("id", "r1")
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            r#"UPDATE "risks" SET "where_id" = $1 WHERE "id" = $2"#
        );
        assert_eq!(stmt.param("set_where_id"), Some(&Value::from("legacy-7")));
        assert_eq!(stmt.param("where_id"), Some(&Value::from("r1")));
    }

    #[test]
    fn test_update_requires_where() {
        let err = UpdateQb::new()
            .table("risks")
            .values(&rename())
            .build()
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("avoid affecting all rows"));
    }

    #[test]
    fn test_update_requires_table_and_data() {
        assert!(UpdateQb::new().values(&rename()).eq("id", 1i64).build().unwrap_err().is_config());
        assert!(UpdateQb::new().table("risks").eq("id", 1i64).build().unwrap_err().is_config());
    }

    #[test]
    fn test_skip_nulls() {
        let partial = UpdateRisk {
            name: "Vishing".into(),
            status: None,
        };
        let stmt = UpdateQb::new()
            .table("risks")
            .values(&partial)
            .skip_nulls()
            .eq("id", "r1")
            .build()
            .unwrap();
        assert_eq!(stmt.sql(), r#"UPDATE "risks" SET "name" = $1 WHERE "id" = $2"#);
    }

    #[test]
    fn test_skip_nulls_with_nothing_left_is_config_error() {
        let data = ShapeValues::new().with("status", Value::Null).unwrap();
        let err = UpdateQb::new()
            .table("risks")
            .values_raw(data)
            .skip_nulls()
            .eq("id", "r1")
            .build()
            .unwrap_err();
        assert!(err.is_config());
    }
}
