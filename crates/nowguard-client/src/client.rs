//! The remote data client capability
//!
//! The governance core never talks to the network. Transport, URL building,
//! authentication and retries live behind this trait.

use crate::error::ClientError;
use crate::types::{AggregateRequest, AggregateStats, GetOptions, QueryPage, QueryRequest, Record};
use std::sync::Arc;

/// Result alias for remote calls
pub type ClientResult<T> = Result<T, ClientError>;

/// Capability to read and write records in the remote store
///
/// Implementations must be safe to share between concurrent request
/// handlers; the core holds them behind shared references.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteDataClient: Send + Sync {
    /// Fetch one record by table and identifier
    async fn get_record(
        &self,
        table: &str,
        id: &str,
        options: &GetOptions,
    ) -> ClientResult<Record>;

    /// Run a filtered, paginated query
    async fn query_records(&self, request: &QueryRequest) -> ClientResult<QueryPage>;

    /// Run an aggregate/statistics query
    async fn aggregate(&self, request: &AggregateRequest) -> ClientResult<AggregateStats>;

    /// Create a record, returning it as stored
    async fn create_record(&self, table: &str, data: &Record) -> ClientResult<Record>;

    /// Update a record, returning it as stored
    async fn update_record(&self, table: &str, id: &str, data: &Record) -> ClientResult<Record>;

    /// Delete a record
    async fn delete_record(&self, table: &str, id: &str) -> ClientResult<bool>;
}

#[async_trait::async_trait]
impl<T: RemoteDataClient + ?Sized> RemoteDataClient for Arc<T> {
    async fn get_record(
        &self,
        table: &str,
        id: &str,
        options: &GetOptions,
    ) -> ClientResult<Record> {
        (**self).get_record(table, id, options).await
    }

    async fn query_records(&self, request: &QueryRequest) -> ClientResult<QueryPage> {
        (**self).query_records(request).await
    }

    async fn aggregate(&self, request: &AggregateRequest) -> ClientResult<AggregateStats> {
        (**self).aggregate(request).await
    }

    async fn create_record(&self, table: &str, data: &Record) -> ClientResult<Record> {
        (**self).create_record(table, data).await
    }

    async fn update_record(&self, table: &str, id: &str, data: &Record) -> ClientResult<Record> {
        (**self).update_record(table, id, data).await
    }

    async fn delete_record(&self, table: &str, id: &str) -> ClientResult<bool> {
        (**self).delete_record(table, id).await
    }
}
