//! Condition sets: conjunctions of `column = value` predicates.
//!
//! Used for WHERE clauses and for the existence probes run ahead of mutations.

use crate::error::{DbError, DbResult};
use crate::ident::ColumnRef;
use crate::statement::Binder;
use crate::value::Value;

/// An ordered mapping from column to expected value, interpreted as AND-ed equalities.
///
/// Keys are unique: setting an existing column replaces its value in place.
///
/// # Example
/// ```ignore
/// use pgshape::ConditionSet;
///
/// let conds = ConditionSet::new()
///     .eq("register_id", "reg-1")
///     .eq("name", "Phishing Risk");
/// assert_eq!(conds.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionSet {
    entries: Vec<(String, Value)>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) `column = value`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Add (or replace) `column = value` in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Fail with a configuration error when empty.
    ///
    /// Mutations call this so an unscoped UPDATE/DELETE can never be built.
    pub fn require_non_empty(&self, what: &str) -> DbResult<()> {
        if self.is_empty() {
            return Err(DbError::config(format!(
                "{what} conditions must be provided to avoid affecting all rows"
            )));
        }
        Ok(())
    }

    /// Write the predicates as `col = $n AND ...`.
    ///
    /// Each value is bound as `<namespace><column>`. Column names are resolved
    /// with [`ColumnRef::resolve`], so `alias.col` is qualified and a bare
    /// column picks up `qualifier` when one is given.
    pub(crate) fn write_predicates(
        &self,
        out: &mut String,
        binder: &mut Binder,
        namespace: &str,
        qualifier: Option<&str>,
    ) -> DbResult<()> {
        for (i, (column, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push_str(" AND ");
            }
            ColumnRef::resolve(column, qualifier)?.write_sql(out);
            out.push_str(" = ");
            let placeholder = binder.bind(format!("{namespace}{column}"), value.clone())?;
            out.push_str(&placeholder);
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for ConditionSet
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ConditionSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}
