//! # pgshape
//!
//! Parameterized SQL statement builders for Postgres, driven by typed row shapes.
//!
//! ## Features
//!
//! - **Injection-safe by construction**: every identifier is quoted, every value is a bound parameter
//! - **Row shapes**: declare a struct's column list once with [`row_shape!`]
//! - **Existence-checked writes**: insert-if-absent, update/delete-if-present
//! - **Transaction-friendly**: pass a transaction anywhere a [`Connection`] is expected
//! - **Safe defaults**: UPDATE and DELETE cannot be built without WHERE conditions
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use pgshape::{ConditionSet, qb::{self, MutationQb}, row_shape};
//!
//! struct NewRisk { id: String, name: String }
//! row_shape!(NewRisk { id, name });
//!
//! let created = qb::insert("risks")
//!     .values(&NewRisk { id: "r1".into(), name: "Phishing Risk".into() })
//!     .check_exists(ConditionSet::new().eq("name", "Phishing Risk"))
//!     .returning(&["id", "name"])
//!     .execute(&client)
//!     .await?;
//!
//! let risks = qb::select("risks")
//!     .select::<NewRisk>()
//!     .order_by_asc("name")
//!     .fetch_all(&client)
//!     .await?;
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod error;
pub mod exec;
pub mod ident;
pub mod prelude;
pub mod qb;
pub mod record;
pub mod shape;
pub mod statement;
pub mod transaction;
pub mod value;

pub use client::Connection;
pub use condition::ConditionSet;
pub use config::DbConfig;
pub use error::{Action, DbError, DbResult, DriverError};
pub use ident::{ColumnRef, Ident};
pub use record::Record;
pub use shape::{RowShape, ShapeValues};
pub use statement::{Binder, BuiltStatement};
pub use value::Value;

// Re-export qb module for easy access
pub use qb::{
    DeleteQb, InsertQb, Join, JoinKind, JoinOn, MutationQb, Order, SelectQb, SqlQb, UpdateQb,
    delete, insert, select, select_as, update,
};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{acquire, create_pool, create_pool_with_config};
