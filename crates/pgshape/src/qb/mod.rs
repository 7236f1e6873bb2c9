//! Query builders for pgshape.
//!
//! Every builder composes a [`BuiltStatement`](crate::BuiltStatement): quoted
//! identifiers in the SQL text, every value bound as a positional parameter.
//! Mutations run through [`MutationQb::execute`], which performs the
//! optional existence probe before the statement itself.
//!
//! # Usage
//!
//! ```ignore
//! use pgshape::qb::{self, MutationQb};
//!
//! // SELECT
//! let risks = qb::select("risks")
//!     .select::<ReadRisk>()
//!     .eq("register_id", register_id)
//!     .order_by_desc("created_at")
//!     .limit(20)
//!     .fetch_all_as::<ReadRisk>(&client)
//!     .await?;
//!
//! // INSERT, refusing duplicates
//! let created = qb::insert("risks")
//!     .values(&new_risk)
//!     .check_exists(ConditionSet::new().eq("name", &new_risk.name))
//!     .returning(&["id", "name"])
//!     .execute(&client)
//!     .await?;
//!
//! // UPDATE
//! qb::update("risks")
//!     .values(&changes)
//!     .eq("id", risk_id)
//!     .execute(&client)
//!     .await?;
//!
//! // DELETE
//! qb::delete("risks")
//!     .eq("id", risk_id)
//!     .check_exists_where()
//!     .execute(&client)
//!     .await?;
//! ```

mod delete;
mod insert;
mod select;
mod traits;
mod update;

pub use delete::DeleteQb;
pub use insert::InsertQb;
pub use select::{Join, JoinKind, JoinOn, Order, SelectQb};
pub use traits::{MutationQb, Precondition, SqlQb};
pub use update::UpdateQb;

/// Create a SELECT query builder for the given table.
pub fn select(table: &str) -> SelectQb {
    SelectQb::new().from_table(table)
}

/// Create a SELECT query builder for the given table under an alias.
///
/// # Example
/// ```ignore
/// let qb = pgshape::qb::select_as("risks", "risk").eq("risk.id", 1);
/// ```
pub fn select_as(table: &str, alias: &str) -> SelectQb {
    SelectQb::new().from_table_as(table, alias)
}

/// Create an INSERT query builder for the given table.
pub fn insert(table: &str) -> InsertQb {
    InsertQb::new().into_table(table)
}

/// Create an UPDATE query builder for the given table.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new().table(table)
}

/// Create a DELETE query builder for the given table.
///
/// The statement cannot be built until at least one WHERE condition is set.
pub fn delete(table: &str) -> DeleteQb {
    DeleteQb::new().from_table(table)
}

#[cfg(test)]
mod tests;
