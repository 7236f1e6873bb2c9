//! Transaction helper macro.
//!
//! Builders take any [`Connection`](crate::Connection), and transactions are
//! connections too. Passing a transaction runs a mutation's existence probe
//! and the statement itself on the same transaction.
//!
//! # Example
//!
//! ```ignore
//! use pgshape::{ConditionSet, DbResult, qb::{self, MutationQb}};
//!
//! # async fn demo(client: &mut tokio_postgres::Client) -> DbResult<()> {
//! pgshape::transaction!(client, tx, {
//!     qb::update("risks")
//!         .values(&changes)
//!         .eq("id", "r1")
//!         .check_exists(ConditionSet::new().eq("id", "r1"))
//!         .execute(&tx)
//!         .await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via `$client.transaction().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)` and returns the block's error.
///
/// The block must evaluate to `pgshape::DbResult<T>`. Failures to begin,
/// commit or roll back surface as [`DbError::Transaction`](crate::DbError::Transaction).
/// If the enclosing future is dropped mid-block the transaction is dropped
/// with it, which rolls it back.
#[macro_export]
macro_rules! transaction {
    ($client:expr, $tx:ident, $body:block) => {{
        let $tx = ($client)
            .transaction()
            .await
            .map_err($crate::DbError::transaction)?;

        let __pgshape_tx_body_result = async { $body }.await;
        match __pgshape_tx_body_result {
            Ok(value) => {
                $tx.commit()
                    .await
                    .map_err($crate::DbError::transaction)?;
                Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::DbError::Transaction(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}
