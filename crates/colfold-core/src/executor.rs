//! The seam between the engine and whatever actually runs queries.

use async_trait::async_trait;

use crate::binding::SqlRequest;
use crate::error::ExecutionError;
use crate::table::Row;

/// Runs a bound request and returns its rows.
///
/// Timeouts, retries and cancellation belong to the implementor. The engine
/// awaits each call to completion before issuing the next.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn query(&self, request: &SqlRequest) -> Result<Vec<Row>, ExecutionError>;
}

#[async_trait]
impl<T: QueryExecutor + ?Sized> QueryExecutor for std::sync::Arc<T> {
    async fn query(&self, request: &SqlRequest) -> Result<Vec<Row>, ExecutionError> {
        (**self).query(request).await
    }
}

#[async_trait]
impl<T: QueryExecutor + ?Sized> QueryExecutor for &T {
    async fn query(&self, request: &SqlRequest) -> Result<Vec<Row>, ExecutionError> {
        (**self).query(request).await
    }
}
