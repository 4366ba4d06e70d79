//! Policy-enforcing client decorator
//!
//! Investigations receive a [`GuardedClient`] instead of the raw client, so
//! every table they touch passes the deny-list and every record they read
//! comes back masked. Writes are refused outright; investigations are
//! read-only.

use nowguard_client::{
    AggregateRequest, AggregateStats, ClientError, ClientResult, GetOptions, QueryPage,
    QueryRequest, Record, RemoteDataClient,
};
use nowguard_policy::{check_table_access, mask_sensitive_fields};

/// Read-only, access-checked, masking view over a client
#[derive(Debug)]
pub struct GuardedClient<'a, C: ?Sized> {
    inner: &'a C,
}

impl<'a, C: RemoteDataClient + ?Sized> GuardedClient<'a, C> {
    /// Wrap `inner`
    #[inline]
    #[must_use]
    pub fn new(inner: &'a C) -> Self {
        Self { inner }
    }

    fn guard(&self, table: &str) -> ClientResult<()> {
        check_table_access(table).map_err(|err| {
            tracing::warn!(table, "investigation touched a denied table");
            ClientError::Forbidden(err.to_string())
        })
    }
}

fn refuse_write(table: &str) -> ClientError {
    tracing::warn!(table, "write attempted through read-only client");
    ClientError::Forbidden(format!("write to table '{table}' is not allowed here"))
}

#[async_trait::async_trait]
impl<'a, C: RemoteDataClient + ?Sized> RemoteDataClient for GuardedClient<'a, C> {
    async fn get_record(
        &self,
        table: &str,
        id: &str,
        options: &GetOptions,
    ) -> ClientResult<Record> {
        self.guard(table)?;
        let record = self.inner.get_record(table, id, options).await?;
        Ok(mask_sensitive_fields(&record))
    }

    async fn query_records(&self, request: &QueryRequest) -> ClientResult<QueryPage> {
        self.guard(&request.table)?;
        let mut page = self.inner.query_records(request).await?;
        page.records = page.records.iter().map(mask_sensitive_fields).collect();
        Ok(page)
    }

    async fn aggregate(&self, request: &AggregateRequest) -> ClientResult<AggregateStats> {
        self.guard(&request.table)?;
        self.inner.aggregate(request).await
    }

    async fn create_record(&self, table: &str, _data: &Record) -> ClientResult<Record> {
        Err(refuse_write(table))
    }

    async fn update_record(&self, table: &str, _id: &str, _data: &Record) -> ClientResult<Record> {
        Err(refuse_write(table))
    }

    async fn delete_record(&self, table: &str, _id: &str) -> ClientResult<bool> {
        Err(refuse_write(table))
    }
}
