/*!
 * Unit of work
 *
 * Every ledger mutation runs inside `with_transaction`: the block commits when
 * it returns `Ok` and rolls back when it returns `Err`, and the typed
 * `ServiceError` produced inside the block reaches the caller unchanged.
 */

use crate::errors::ServiceError;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a block of operations within a single database transaction.
///
/// # Example
///
/// ```rust,ignore
/// let (variant, log) = with_transaction(&db, move |txn| {
///     Box::pin(async move { apply_adjustment(txn, &request).await })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T>(db: &DatabaseConnection, f: F) -> Result<T, ServiceError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, ServiceError>> + Send,
    T: Send,
{
    let result = db.transaction::<F, T, ServiceError>(f).await;

    match result {
        Ok(value) => {
            debug!("Transaction committed");
            Ok(value)
        }
        Err(TransactionError::Connection(db_err)) => {
            warn!(error = %db_err, "Transaction failed at the connection level");
            Err(ServiceError::DatabaseError(db_err))
        }
        Err(TransactionError::Transaction(err)) => {
            debug!(error = %err, "Transaction rolled back");
            Err(err)
        }
    }
}
