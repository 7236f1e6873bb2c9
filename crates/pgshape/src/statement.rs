//! Built statements and the parameter binder that produces them.
//!
//! Builders never format a value into SQL text. Each value goes through
//! [`Binder::bind`], which records it under a name and returns the positional
//! placeholder (`$1`, `$2`, ...) tokio-postgres expects.

use crate::error::{DbError, DbResult};
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// Accumulates named parameters during one build pass.
#[derive(Debug, Default)]
pub struct Binder {
    params: Vec<(String, Value)>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` under `name` and return its placeholder.
    ///
    /// Names are unique within a statement; binding the same name twice is a
    /// configuration error rather than a silent overwrite.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) -> DbResult<String> {
        let name = name.into();
        if self.params.iter().any(|(n, _)| *n == name) {
            return Err(DbError::config(format!(
                "parameter '{name}' bound twice in one statement"
            )));
        }
        self.params.push((name, value));
        Ok(format!("${}", self.params.len()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Finish the pass, pairing the SQL text with the bound parameters.
    pub fn finish(self, sql: String) -> BuiltStatement {
        BuiltStatement {
            sql,
            params: self.params,
        }
    }
}

/// An immutable (SQL text, named parameters) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltStatement {
    sql: String,
    params: Vec<(String, Value)>,
}

impl BuiltStatement {
    /// Wrap a caller-written statement using `$1..$n` placeholders.
    ///
    /// This is an escape hatch: the SQL text is trusted as-is and must never be
    /// assembled from untrusted input. Values are still bound, never formatted.
    pub fn raw(sql: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        let params = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("${}", i + 1), v))
            .collect();
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Look up a bound value by parameter name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Parameter names in placeholder order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(n, _)| n.as_str())
    }

    /// Bound values in placeholder order (`$1` first).
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.params.iter().map(|(_, v)| v)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Get parameters as references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|(_, v)| v as &(dyn ToSql + Sync))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_returns_positional_placeholders() {
        let mut binder = Binder::new();
        assert_eq!(binder.bind("id", Value::Int(1)).unwrap(), "$1");
        assert_eq!(binder.bind("where_id", Value::Int(2)).unwrap(), "$2");
        let stmt = binder.finish("UPDATE t SET id = $1 WHERE id = $2".into());
        assert_eq!(stmt.param("where_id"), Some(&Value::Int(2)));
        assert_eq!(stmt.param_names().collect::<Vec<_>>(), vec!["id", "where_id"]);
    }

    #[test]
    fn bind_rejects_duplicate_name() {
        let mut binder = Binder::new();
        binder.bind("limit", Value::Int(1)).unwrap();
        assert!(binder.bind("limit", Value::Int(2)).unwrap_err().is_config());
    }

    #[test]
    fn raw_numbers_params() {
        let stmt = BuiltStatement::raw("SELECT $1", [Value::from("x")]);
        assert_eq!(stmt.param("$1"), Some(&Value::from("x")));
        assert_eq!(stmt.params_ref().len(), 1);
    }
}
