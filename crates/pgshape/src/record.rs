//! Result rows as column-keyed mappings.

use crate::error::{DbError, DbResult};
use crate::value::Value;
use serde::de::DeserializeOwned;
use tokio_postgres::Row;

/// One result row: driver-reported column names paired with their values.
///
/// Column names are the ones the store returned (output aliases included), not
/// the names the caller asked for. Records own their data and keep no link to
/// the statement or connection that produced them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from (column, value) pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Materialize a tokio-postgres row.
    pub fn from_row(row: &Row) -> DbResult<Self> {
        let mut columns = Vec::with_capacity(row.len());
        for (idx, column) in row.columns().iter().enumerate() {
            let value: Value = row
                .try_get(idx)
                .map_err(|e| DbError::decode(column.name(), e.to_string()))?;
            columns.push((column.name().to_string(), value));
        }
        Ok(Self { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in result order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Value of the first column named `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    /// Decode one column into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, column: &str) -> DbResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| DbError::decode(column, "column not present in result row"))?;
        serde_json::from_value(value.to_json()).map_err(|e| DbError::decode(column, e.to_string()))
    }

    /// Convert to a JSON object. When two columns share a name, the first wins.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.columns.len());
        for (column, value) in &self.columns {
            if !map.contains_key(column) {
                map.insert(column.clone(), value.to_json());
            }
        }
        serde_json::Value::Object(map)
    }

    /// Re-hydrate into a typed shape.
    ///
    /// Extra columns are ignored unless `T` denies unknown fields, so join
    /// projections can carry more columns than the target type declares.
    pub fn decode<T: DeserializeOwned>(&self) -> DbResult<T> {
        serde_json::from_value(self.to_json()).map_err(|e| DbError::decode("<row>", e.to_string()))
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}
