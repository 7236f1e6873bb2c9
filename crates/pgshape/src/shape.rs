//! Row shapes: explicit, ordered field lists for records.
//!
//! A row shape names the columns of one table row. Builders use it to enumerate
//! INSERT columns, UPDATE assignments and SELECT projections without hand-listing
//! column names at every call site. The field list is a constant fixed when the
//! shape is declared, so nothing is re-derived per call.
//!
//! # Example
//! ```ignore
//! use pgshape::row_shape;
//!
//! struct NewRisk {
//!     risk_id: String,
//!     name: String,
//!     description: Option<String>,
//! }
//!
//! row_shape!(NewRisk { risk_id, name, description });
//!
//! assert_eq!(<NewRisk as pgshape::RowShape>::FIELDS, &["risk_id", "name", "description"]);
//! ```

use crate::error::{DbError, DbResult};
use crate::value::Value;

/// A typed, ordered set of named fields describing one table row.
pub trait RowShape {
    /// Declared field names, in column order.
    const FIELDS: &'static [&'static str];

    /// Field values of this instance, in the same order as [`RowShape::FIELDS`].
    fn values(&self) -> Vec<Value>;

    /// Returns `Some(name)` if `name` is a declared field.
    fn field(name: &str) -> Option<&'static str> {
        Self::FIELDS.iter().copied().find(|f| *f == name)
    }

    /// Whether `name` is a declared field.
    fn has_field(name: &str) -> bool {
        Self::field(name).is_some()
    }

    /// Capture this instance as ordered (field, value) pairs.
    fn shape_values(&self) -> DbResult<ShapeValues> {
        ShapeValues::from_shape(self)
    }
}

/// Implement [`RowShape`] for a struct by listing its fields in column order.
///
/// Every listed field must be `Clone` and convertible into [`Value`].
#[macro_export]
macro_rules! row_shape {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::RowShape for $ty {
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn values(&self) -> ::std::vec::Vec<$crate::Value> {
                ::std::vec![$($crate::Value::from(::std::clone::Clone::clone(&self.$field))),+]
            }
        }
    };
}

/// Ordered (field, value) pairs captured from one row-shape instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeValues {
    fields: Vec<(String, Value)>,
}

impl ShapeValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a row shape, checking its value count against its field list.
    pub fn from_shape<S: RowShape + ?Sized>(shape: &S) -> DbResult<Self> {
        let values = shape.values();
        if values.len() != S::FIELDS.len() {
            return Err(DbError::config(format!(
                "row shape declares {} fields but produced {} values",
                S::FIELDS.len(),
                values.len()
            )));
        }
        let mut out = Self::new();
        for (field, value) in S::FIELDS.iter().zip(values) {
            out.push(*field, value)?;
        }
        Ok(out)
    }

    /// Append a field. Field names must be unique.
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<Value>) -> DbResult<()> {
        let field = field.into();
        if self.fields.iter().any(|(f, _)| *f == field) {
            return Err(DbError::config(format!("duplicate field '{field}' in row shape")));
        }
        self.fields.push((field, value.into()));
        Ok(())
    }

    /// Builder-style [`ShapeValues::push`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> DbResult<Self> {
        self.push(field, value)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(f, _)| f.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v))
    }

    /// Drop fields whose value is NULL.
    pub fn without_nulls(mut self) -> Self {
        self.fields.retain(|(_, v)| !v.is_null());
        self
    }
}
