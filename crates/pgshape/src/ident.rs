//! Safe SQL identifier handling.
//!
//! Every table, alias and column name that reaches SQL text goes through
//! [`Ident`] or [`ColumnRef`]. Identifiers are always rendered double-quoted,
//! with embedded `"` escaped as `""`, so a caller-supplied name can never
//! terminate the identifier early.
//!
//! # Example
//! ```ignore
//! use pgshape::{ColumnRef, Ident};
//!
//! assert_eq!(Ident::new("risks")?.to_sql(), r#""risks""#);
//! assert_eq!(ColumnRef::parse("usr.name")?.to_sql(), r#""usr"."name""#);
//! # Ok::<(), pgshape::DbError>(())
//! ```

use crate::error::{DbError, DbResult};
use std::fmt;

/// A single SQL identifier (table, alias, or column name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    /// Validate a raw name. Empty names and names containing NUL are rejected.
    pub fn new(name: &str) -> DbResult<Self> {
        if name.is_empty() {
            return Err(DbError::config("Identifier cannot be empty"));
        }
        if name.contains('\0') {
            return Err(DbError::config("Identifier cannot contain NUL character"));
        }
        Ok(Self(name.to_string()))
    }

    /// The raw, unquoted name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 2);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        out.push('"');
        for ch in self.0.chars() {
            if ch == '"' {
                out.push('"');
            }
            out.push(ch);
        }
        out.push('"');
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// A column reference, optionally qualified by a table or alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub qualifier: Option<Ident>,
    pub column: Ident,
}

impl ColumnRef {
    /// Unqualified column.
    pub fn bare(column: &str) -> DbResult<Self> {
        Ok(Self {
            qualifier: None,
            column: Ident::new(column)?,
        })
    }

    /// Column qualified by a table or alias.
    pub fn qualified(qualifier: &str, column: &str) -> DbResult<Self> {
        Ok(Self {
            qualifier: Some(Ident::new(qualifier)?),
            column: Ident::new(column)?,
        })
    }

    /// Parse a path: `alias.column` splits on the first `.`, anything else is bare.
    pub fn parse(path: &str) -> DbResult<Self> {
        match path.split_once('.') {
            Some((qualifier, column)) => Self::qualified(qualifier, column),
            None => Self::bare(path),
        }
    }

    /// Parse a path, qualifying a bare column with `default_qualifier` when given.
    pub fn resolve(path: &str, default_qualifier: Option<&str>) -> DbResult<Self> {
        match (path.split_once('.'), default_qualifier) {
            (Some((qualifier, column)), _) => Self::qualified(qualifier, column),
            (None, Some(qualifier)) => Self::qualified(qualifier, path),
            (None, None) => Self::bare(path),
        }
    }

    /// Render the column reference as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        if let Some(qualifier) = &self.qualifier {
            qualifier.write_sql(out);
            out.push('.');
        }
        self.column.write_sql(out);
    }
}

/// Render a comma-separated list of quoted identifiers.
pub(crate) fn write_ident_list<'a>(
    out: &mut String,
    names: impl IntoIterator<Item = &'a str>,
) -> DbResult<()> {
    for (i, name) in names.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        Ident::new(name)?.write_sql(out);
    }
    Ok(())
}
