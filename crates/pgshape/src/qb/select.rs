//! SELECT query builder.

use crate::client::Connection;
use crate::condition::ConditionSet;
use crate::error::{Action, DbError, DbResult};
use crate::exec;
use crate::ident::{ColumnRef, Ident};
use crate::qb::traits::SqlQb;
use crate::record::Record;
use crate::shape::RowShape;
use crate::statement::{Binder, BuiltStatement};
use crate::value::Value;
use serde::de::DeserializeOwned;

/// JOIN kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// ON predicate of a join.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// AND-ed `left = right` column equalities; both sides are quoted column paths.
    Eq(Vec<(String, String)>),
    /// Trusted SQL text appended verbatim.
    ///
    /// This is an escape hatch for predicates the structured form cannot express.
    /// It must only ever be built from constants, never from request input.
    Raw(String),
}

impl JoinOn {
    /// `left = right`, e.g. `JoinOn::eq("rt.risk_id", "risk.risk_id")`.
    pub fn eq(left: impl Into<String>, right: impl Into<String>) -> Self {
        JoinOn::Eq(vec![(left.into(), right.into())])
    }

    /// Add another equality to a structured predicate.
    ///
    /// On a raw predicate the equality is appended with `AND`.
    pub fn and(self, left: impl Into<String>, right: impl Into<String>) -> Self {
        match self {
            JoinOn::Eq(mut pairs) => {
                pairs.push((left.into(), right.into()));
                JoinOn::Eq(pairs)
            }
            JoinOn::Raw(sql) => {
                let left = left.into();
                let right = right.into();
                match (ColumnRef::parse(&left), ColumnRef::parse(&right)) {
                    (Ok(l), Ok(r)) => JoinOn::Raw(format!("{sql} AND {} = {}", l.to_sql(), r.to_sql())),
                    // Keep the structured form so the bad path fails at build time.
                    _ => JoinOn::Eq(vec![(left, right)]),
                }
            }
        }
    }

    /// Trusted raw predicate.
    pub fn raw(sql: impl Into<String>) -> Self {
        JoinOn::Raw(sql.into())
    }

    fn write_sql(&self, out: &mut String) -> DbResult<()> {
        match self {
            JoinOn::Eq(pairs) => {
                if pairs.is_empty() {
                    return Err(DbError::config("JOIN requires an ON predicate"));
                }
                for (i, (left, right)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" AND ");
                    }
                    ColumnRef::parse(left)?.write_sql(out);
                    out.push_str(" = ");
                    ColumnRef::parse(right)?.write_sql(out);
                }
                Ok(())
            }
            JoinOn::Raw(sql) => {
                if sql.trim().is_empty() {
                    return Err(DbError::config("JOIN requires an ON predicate"));
                }
                out.push_str(sql);
                Ok(())
            }
        }
    }
}

/// One JOIN of a read query.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    kind: JoinKind,
    table: String,
    alias: Option<String>,
    on: JoinOn,
    /// Projected fields for [`SelectQb::select_joins`].
    fields: Option<Vec<String>>,
    use_prefix: bool,
}

impl Join {
    pub fn new(kind: JoinKind, table: impl Into<String>, on: JoinOn) -> Self {
        Self {
            kind,
            table: table.into(),
            alias: None,
            on,
            fields: None,
            use_prefix: true,
        }
    }

    pub fn left(table: impl Into<String>, on: JoinOn) -> Self {
        Self::new(JoinKind::Left, table, on)
    }

    pub fn right(table: impl Into<String>, on: JoinOn) -> Self {
        Self::new(JoinKind::Right, table, on)
    }

    pub fn inner(table: impl Into<String>, on: JoinOn) -> Self {
        Self::new(JoinKind::Inner, table, on)
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Project the fields of row shape `S` from this join.
    pub fn shape<S: RowShape>(mut self) -> Self {
        self.fields = Some(S::FIELDS.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Project an explicit field list from this join.
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Output projected fields as `alias_field` (the default) or as bare `field`.
    pub fn use_prefix(mut self, use_prefix: bool) -> Self {
        self.use_prefix = use_prefix;
        self
    }

    fn write_sql(&self, out: &mut String) -> DbResult<()> {
        out.push(' ');
        out.push_str(self.kind.as_sql());
        out.push(' ');
        Ident::new(&self.table)?.write_sql(out);
        if let Some(alias) = &self.alias {
            out.push_str(" AS ");
            Ident::new(alias)?.write_sql(out);
        }
        out.push_str(" ON ");
        self.on.write_sql(out)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// SELECT query builder.
///
/// # Example
/// ```ignore
/// let risk = qb::select_as("risks", "risk")
///     .select::<ReadRisk>()
///     .join(
///         Join::left("risk_ratings", JoinOn::eq("rt.risk_id", "risk.risk_id"))
///             .alias("rt")
///             .shape::<RiskRatingJoin>(),
///     )
///     .select_joins()
///     .eq("risk.risk_id", risk_id)
///     .fetch_one(&conn)
///     .await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct SelectQb {
    table: Option<String>,
    alias: Option<String>,
    /// Selected (path, output alias) pairs; empty means `*`
    select: Vec<(String, Option<String>)>,
    joins: Vec<Join>,
    conditions: ConditionSet,
    group_by: Vec<String>,
    order_by: Vec<(String, Order)>,
    limit: Option<i64>,
    offset: Option<i64>,
    distinct: bool,
}

impl SelectQb {
    /// Create an empty builder. A table must be set before building.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source table.
    pub fn from_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self.alias = None;
        self
    }

    /// Set the source table with an alias.
    pub fn from_table_as(mut self, table: impl Into<String>, alias: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self.alias = Some(alias.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ==================== SELECT columns ====================

    /// Select the fields of row shape `S`, replacing the current selection.
    pub fn select<S: RowShape>(mut self) -> Self {
        self.select = S::FIELDS.iter().map(|f| (f.to_string(), None)).collect();
        self
    }

    /// Append selected fields.
    pub fn select_fields(mut self, fields: &[&str]) -> Self {
        self.select
            .extend(fields.iter().map(|f| (f.to_string(), None)));
        self
    }

    /// Append one selected field under an output alias.
    pub fn select_field_as(mut self, field: impl Into<String>, alias: impl Into<String>) -> Self {
        self.select.push((field.into(), Some(alias.into())));
        self
    }

    /// Selected (path, output alias) pairs, in order.
    pub fn selected(&self) -> &[(String, Option<String>)] {
        &self.select
    }

    // ==================== JOIN ====================

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Add LEFT JOIN.
    pub fn left_join(self, table: &str, alias: &str, on: JoinOn) -> Self {
        self.join(Join::left(table, on).alias(alias))
    }

    /// Add RIGHT JOIN.
    pub fn right_join(self, table: &str, alias: &str, on: JoinOn) -> Self {
        self.join(Join::right(table, on).alias(alias))
    }

    /// Add INNER JOIN.
    pub fn inner_join(self, table: &str, alias: &str, on: JoinOn) -> Self {
        self.join(Join::inner(table, on).alias(alias))
    }

    /// Select every projected field of every join that has both fields and an alias.
    ///
    /// Each field is selected at `alias.field` and output as `alias_field`,
    /// or as bare `field` when the join disabled prefixing.
    pub fn select_joins(mut self) -> Self {
        for join in &self.joins {
            let (Some(fields), Some(alias)) = (&join.fields, &join.alias) else {
                continue;
            };
            for field in fields {
                let output = if join.use_prefix {
                    format!("{alias}_{field}")
                } else {
                    field.clone()
                };
                self.select.push((format!("{alias}.{field}"), Some(output)));
            }
        }
        self
    }

    // ==================== WHERE ====================

    /// Add WHERE: column = value
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(column, value);
        self
    }

    /// Add every condition of a set.
    pub fn where_all(mut self, conditions: &ConditionSet) -> Self {
        for (column, value) in conditions.iter() {
            self.conditions.insert(column, value.clone());
        }
        self
    }

    // ==================== Ordering & Grouping ====================

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    /// Add ORDER BY column ASC.
    pub fn order_by_asc(self, column: impl Into<String>) -> Self {
        self.order_by(column, Order::Asc)
    }

    /// Add ORDER BY column DESC.
    pub fn order_by_desc(self, column: impl Into<String>) -> Self {
        self.order_by(column, Order::Desc)
    }

    // ==================== Pagination ====================

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    pub fn paginate(mut self, page: i64, per_page: i64) -> Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.limit = Some(size);
        self.offset = Some((p - 1) * size);
        self
    }

    // ==================== Build ====================

    fn table(&self) -> DbResult<&str> {
        match self.table.as_deref() {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(DbError::config("Table name cannot be empty")),
        }
    }

    fn write_select_list(&self, sql: &mut String) -> DbResult<()> {
        if self.select.is_empty() {
            sql.push('*');
            return Ok(());
        }
        for (i, (path, output)) in self.select.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            ColumnRef::resolve(path, self.alias.as_deref())?.write_sql(sql);
            if let Some(output) = output {
                sql.push_str(" AS ");
                Ident::new(output)?.write_sql(sql);
            }
        }
        Ok(())
    }

    /// Everything from FROM through GROUP BY.
    fn write_body(&self, sql: &mut String, binder: &mut Binder) -> DbResult<()> {
        sql.push_str(" FROM ");
        Ident::new(self.table()?)?.write_sql(sql);
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            Ident::new(alias)?.write_sql(sql);
        }

        for join in &self.joins {
            join.write_sql(sql)?;
        }

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            self.conditions
                .write_predicates(sql, binder, "where_", self.alias.as_deref())?;
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            for (i, column) in self.group_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                ColumnRef::parse(column)?.write_sql(sql);
            }
        }
        Ok(())
    }

    fn build_select(&self) -> DbResult<BuiltStatement> {
        let mut binder = Binder::new();
        let mut sql = String::from(if self.distinct {
            "SELECT DISTINCT "
        } else {
            "SELECT "
        });
        self.write_select_list(&mut sql)?;
        self.write_body(&mut sql, &mut binder)?;

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, (column, order)) in self.order_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                ColumnRef::parse(column)?.write_sql(&mut sql);
                sql.push_str(match order {
                    Order::Asc => " ASC",
                    Order::Desc => " DESC",
                });
            }
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&binder.bind("limit", Value::Int(limit))?);
        }
        if let Some(offset) = self.offset {
            sql.push_str(" OFFSET ");
            sql.push_str(&binder.bind("offset", Value::Int(offset))?);
        }

        Ok(binder.finish(sql))
    }

    /// Build `SELECT COUNT(*) AS "count" FROM (...) AS "t"`, ignoring ORDER BY and pagination.
    pub fn build_count(&self) -> DbResult<BuiltStatement> {
        let mut binder = Binder::new();
        let mut inner = String::from(if self.distinct {
            "SELECT DISTINCT "
        } else {
            "SELECT "
        });
        self.write_select_list(&mut inner)?;
        self.write_body(&mut inner, &mut binder)?;
        Ok(binder.finish(format!(
            r#"SELECT COUNT(*) AS "count" FROM ({inner}) AS "t""#
        )))
    }

    // ==================== Execution ====================

    /// Execute and return every row (possibly none).
    pub async fn fetch_all(&self, conn: &impl Connection) -> DbResult<Vec<Record>> {
        let stmt = self.build()?;
        exec::fetch_all(conn, Action::Read, self.table()?, &stmt).await
    }

    /// Execute and return the first row, or `None` when nothing matched.
    pub async fn fetch_one(&self, conn: &impl Connection) -> DbResult<Option<Record>> {
        let stmt = self.build()?;
        exec::fetch_opt(conn, Action::Read, self.table()?, &stmt).await
    }

    /// Execute and re-hydrate every row into `T`.
    pub async fn fetch_all_as<T: DeserializeOwned>(&self, conn: &impl Connection) -> DbResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(Record::decode).collect()
    }

    /// Execute and re-hydrate the first row into `T`.
    pub async fn fetch_one_as<T: DeserializeOwned>(
        &self,
        conn: &impl Connection,
    ) -> DbResult<Option<T>> {
        let row = self.fetch_one(conn).await?;
        row.as_ref().map(Record::decode).transpose()
    }

    /// Execute the COUNT query.
    pub async fn count(&self, conn: &impl Connection) -> DbResult<i64> {
        let stmt = self.build_count()?;
        let row = exec::fetch_opt(conn, Action::Read, self.table()?, &stmt).await?;
        match row {
            Some(row) => row.get_as("count"),
            None => Ok(0),
        }
    }
}

impl SqlQb for SelectQb {
    fn build(&self) -> DbResult<BuiltStatement> {
        self.build_select()
    }
}
