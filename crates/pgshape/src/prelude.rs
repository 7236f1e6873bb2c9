//! Convenient imports for typical `pgshape` usage.
//!
//! ```ignore
//! use pgshape::prelude::*;
//! ```

pub use crate::qb::{self, Join, JoinOn, MutationQb, Order, SqlQb};
pub use crate::{
    ConditionSet, Connection, DbConfig, DbError, DbResult, Record, RowShape, Value, row_shape,
};

#[cfg(feature = "pool")]
pub use crate::{acquire, create_pool, create_pool_with_config};
