use crate::{db::DbPool, errors::ServiceError};
use async_trait::async_trait;
use std::sync::Arc;

/// Command trait for implementing the Command Pattern
///
/// A command carries a validated request body into a business operation. Handlers
/// deserialize the command, attach the acting admin where relevant and execute it
/// against the shared pool.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given database pool
    async fn execute(&self, db_pool: Arc<DbPool>) -> Result<Self::Result, ServiceError>;
}

/// Metric label for a failed command.
pub(crate) fn failure_label(error: &ServiceError) -> &'static str {
    match error {
        ServiceError::NotFound(_) => "not_found",
        ServiceError::InsufficientStock(_) => "insufficient_stock",
        ServiceError::ValidationError(_) | ServiceError::InvalidFields(_) => "validation_error",
        ServiceError::Unauthorized(_) => "unauthorized",
        ServiceError::DatabaseError(_) => "database_error",
        ServiceError::InternalError(_) | ServiceError::Other(_) => "internal_error",
    }
}

pub mod inventory;
pub mod orders;
pub mod products;
