//! INSERT query builder.

use crate::condition::ConditionSet;
use crate::error::{Action, DbError, DbResult};
use crate::ident::{Ident, write_ident_list};
use crate::qb::traits::{MutationQb, Precondition, SqlQb, check_probe_conditions, write_returning};
use crate::shape::{RowShape, ShapeValues};
use crate::statement::{Binder, BuiltStatement};

/// INSERT query builder.
///
/// Columns are exactly the fields of the row shape, in declared order; each
/// value is bound under its field name.
#[derive(Clone, Debug, Default)]
pub struct InsertQb {
    /// Table name
    table: Option<String>,
    /// Captured (field, value) pairs
    data: Option<ShapeValues>,
    /// Set when capturing the row shape failed; reported at build time
    invalid_data: Option<String>,
    /// RETURNING columns
    returning_cols: Vec<String>,
    /// Probe that must find no row
    check: Option<ConditionSet>,
    /// ON CONFLICT (...) DO NOTHING target
    conflict_target: Option<Vec<String>>,
    /// Caller-provided statement (raw mode)
    raw: Option<BuiltStatement>,
}

impl InsertQb {
    /// Create a new INSERT query builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target table.
    pub fn into_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Insert the fields of a row shape instance.
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

    /// Insert pre-captured (field, value) pairs.
    pub fn values_raw(mut self, data: ShapeValues) -> Self {
        self.data = Some(data);
        self.invalid_data = None;
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

    /// Abort with [`DbError::Duplicate`] when a row matching `conditions` already exists.
    ///
    /// The probe and the insert are separate statements; see
    /// [`InsertQb::on_conflict_do_nothing`] for the atomic alternative.
    pub fn check_exists(mut self, conditions: ConditionSet) -> Self {
        self.check = Some(conditions);
        self
    }

    /// Append `ON CONFLICT (columns) DO NOTHING`.
    ///
    /// The columns must be covered by a unique constraint. When the row is
    /// skipped the builder reports [`DbError::Duplicate`].
    pub fn on_conflict_do_nothing(mut self, columns: &[&str]) -> Self {
        self.conflict_target = Some(columns.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Execute this statement instead of building one. No probe is run.
    pub fn raw(mut self, stmt: BuiltStatement) -> Self {
        self.raw = Some(stmt);
        self
    }
}

impl SqlQb for InsertQb {
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
        check_probe_conditions(self.check.as_ref())?;

        let mut binder = Binder::new();
        let mut sql = String::from("INSERT INTO ");
        Ident::new(table)?.write_sql(&mut sql);
        sql.push_str(" (");
        write_ident_list(&mut sql, data.fields())?;
        sql.push_str(") VALUES (");
        for (i, (field, value)) in data.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&binder.bind(field, value.clone())?);
        }
        sql.push(')');

        if let Some(target) = &self.conflict_target {
            if target.is_empty() {
                return Err(DbError::config("ON CONFLICT requires at least one column"));
            }
            sql.push_str(" ON CONFLICT (");
            write_ident_list(&mut sql, target.iter().map(String::as_str))?;
            sql.push_str(") DO NOTHING");
        }

        write_returning(&mut sql, &self.returning_cols)?;
        Ok(binder.finish(sql))
    }
}

impl MutationQb for InsertQb {
    const ACTION: Action = Action::Insert;

    fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    fn existence_check(&self) -> Option<(&ConditionSet, Precondition)> {
        self.check.as_ref().map(|c| (c, Precondition::Absent))
    }

    fn has_returning(&self) -> bool {
        !self.returning_cols.is_empty()
    }

    fn raw_statement(&self) -> Option<&BuiltStatement> {
        self.raw.as_ref()
    }

    fn zero_rows_is_duplicate(&self) -> bool {
        self.conflict_target.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row_shape;
    use crate::value::Value;

    struct CreateRisk {
        id: String,
        name: String,
        approve: bool,
    }

    row_shape!(CreateRisk { id, name, approve });

    fn phishing() -> CreateRisk {
        CreateRisk {
            id: "r1".into(),
            name: "Phishing Risk".into(),
            approve: false,
        }
    }

    #[test]
    fn test_insert_columns_follow_shape_order() {
        let stmt = InsertQb::new()
            .into_table("risks")
            .values(&phishing())
            .returning(&["id", "name"])
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            r#"INSERT INTO "risks" ("id", "name", "approve") VALUES ($1, $2, $3) RETURNING "id", "name""#
        );
        assert_eq!(stmt.param("name"), Some(&Value::Text("Phishing Risk".into())));
        assert_eq!(stmt.param_count(), 3);
    }

    #[test]
    fn test_insert_requires_table() {
        let err = InsertQb::new().values(&phishing()).build().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_insert_requires_data() {
        let err = InsertQb::new().into_table("risks").build().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_empty_existence_check_rejected() {
        let err = InsertQb::new()
            .into_table("risks")
            .values(&phishing())
            .check_exists(ConditionSet::new())
            .build()
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_on_conflict_do_nothing() {
        let stmt = InsertQb::new()
            .into_table("risks")
            .values(&phishing())
            .on_conflict_do_nothing(&["id"])
            .build()
            .unwrap();
        assert!(stmt.sql().ends_with(r#"VALUES ($1, $2, $3) ON CONFLICT ("id") DO NOTHING"#));
    }

    #[test]
    fn test_values_raw_and_returning_shape() {
        let data = ShapeValues::new()
            .with("id", "r2")
            .unwrap()
            .with("name", Value::Null)
            .unwrap();
        let stmt = InsertQb::new()
            .into_table("risks")
            .values_raw(data)
            .returning_shape::<CreateRisk>()
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            r#"INSERT INTO "risks" ("id", "name") VALUES ($1, $2) RETURNING "id", "name", "approve""#
        );
    }

    #[test]
    fn test_raw_mode_passes_statement_through() {
        let raw = BuiltStatement::raw("INSERT INTO audit_log (msg) VALUES ($1)", [Value::from("x")]);
        let qb = InsertQb::new().raw(raw.clone());
        assert_eq!(qb.build().unwrap(), raw);
    }
}
