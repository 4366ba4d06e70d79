//! Testing utilities for the nowguard workspace
//!
//! Shared fixtures for tests that need a remote data store.

#![allow(missing_docs)]

pub mod filter;

use async_trait::async_trait;
use nowguard_client::{
    field_str, AggregateRequest, AggregateStats, ClientError, ClientResult, GetOptions,
    QueryPage, QueryRequest, Record, RemoteDataClient,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// A call observed by [`FixtureClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get { table: String, id: String },
    Query { table: String, filter: String, limit: Option<usize> },
    Aggregate { table: String, filter: String },
    Create { table: String },
    Update { table: String, id: String },
    Delete { table: String, id: String },
}

impl Call {
    pub fn table(&self) -> &str {
        match self {
            Call::Get { table, .. }
            | Call::Query { table, .. }
            | Call::Aggregate { table, .. }
            | Call::Create { table }
            | Call::Update { table, .. }
            | Call::Delete { table, .. } => table,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, Vec<Record>>,
    failures: HashMap<String, ClientError>,
    counts: HashMap<String, u64>,
    calls: Vec<Call>,
}

/// In-memory remote store
///
/// Records live per table and are matched against encoded filters with
/// [`filter::matches`]. Unknown tables behave as empty. Tables registered
/// with [`FixtureClient::with_failure`] fail every call.
#[derive(Debug, Default)]
pub struct FixtureClient {
    inner: Mutex<Inner>,
}

/// Build a record from a `json!({...})` object literal
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture record must be a JSON object, got {other}"),
    }
}

impl FixtureClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records to a table
    #[must_use]
    pub fn with_records(self, table: &str, records: impl IntoIterator<Item = Value>) -> Self {
        self.inner
            .lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(records.into_iter().map(record));
        self
    }

    /// Make every call against `table` fail
    #[must_use]
    pub fn with_failure(self, table: &str, error: ClientError) -> Self {
        self.inner.lock().failures.insert(table.to_string(), error);
        self
    }

    /// Override the aggregate count for a table
    #[must_use]
    pub fn with_count(self, table: &str, count: u64) -> Self {
        self.inner.lock().counts.insert(table.to_string(), count);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn queries_against(&self, table: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Query { .. }) && c.table() == table)
            .collect()
    }

    pub fn records(&self, table: &str) -> Vec<Record> {
        self.inner.lock().tables.get(table).cloned().unwrap_or_default()
    }

    fn check(inner: &Inner, table: &str) -> ClientResult<()> {
        match inner.failures.get(table) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn project(record: &Record, fields: Option<&[String]>) -> Record {
    match fields {
        None => record.clone(),
        Some(fields) => record
            .iter()
            .filter(|(k, _)| fields.iter().any(|f| f == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

#[async_trait]
impl RemoteDataClient for FixtureClient {
    async fn get_record(&self, table: &str, id: &str, options: &GetOptions) -> ClientResult<Record> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Get {
            table: table.to_string(),
            id: id.to_string(),
        });
        Self::check(&inner, table)?;
        inner
            .tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| field_str(r, "sys_id") == id))
            .map(|r| project(r, options.fields.as_deref()))
            .ok_or_else(|| ClientError::NotFound(format!("{table}/{id}")))
    }

    async fn query_records(&self, request: &QueryRequest) -> ClientResult<QueryPage> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Query {
            table: request.table.clone(),
            filter: request.filter.clone(),
            limit: request.limit,
        });
        Self::check(&inner, &request.table)?;

        let mut matched: Vec<Record> = inner
            .tables
            .get(&request.table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| filter::matches(r, &request.filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some(order) = &request.order_by {
            matched.sort_by_key(|r| field_str(r, order));
        }
        let total_count = matched.len();
        let records = matched
            .into_iter()
            .skip(request.offset)
            .take(request.limit.unwrap_or(usize::MAX))
            .map(|r| project(&r, request.fields.as_deref()))
            .collect();
        Ok(QueryPage {
            records,
            total_count,
        })
    }

    async fn aggregate(&self, request: &AggregateRequest) -> ClientResult<AggregateStats> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Aggregate {
            table: request.table.clone(),
            filter: request.filter.clone(),
        });
        Self::check(&inner, &request.table)?;
        let count = match inner.counts.get(&request.table) {
            Some(count) => *count,
            None => inner
                .tables
                .get(&request.table)
                .map_or(0, |rows| {
                    rows.iter().filter(|r| filter::matches(r, &request.filter)).count() as u64
                }),
        };
        Ok(AggregateStats::with_count(count))
    }

    async fn create_record(&self, table: &str, data: &Record) -> ClientResult<Record> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Create {
            table: table.to_string(),
        });
        Self::check(&inner, table)?;
        let mut created = data.clone();
        created
            .entry("sys_id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().simple().to_string()));
        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update_record(&self, table: &str, id: &str, data: &Record) -> ClientResult<Record> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Update {
            table: table.to_string(),
            id: id.to_string(),
        });
        Self::check(&inner, table)?;
        let row = inner
            .tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| field_str(r, "sys_id") == id))
            .ok_or_else(|| ClientError::NotFound(format!("{table}/{id}")))?;
        for (k, v) in data {
            row.insert(k.clone(), v.clone());
        }
        Ok(row.clone())
    }

    async fn delete_record(&self, table: &str, id: &str) -> ClientResult<bool> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Delete {
            table: table.to_string(),
            id: id.to_string(),
        });
        Self::check(&inner, table)?;
        let rows = inner
            .tables
            .get_mut(table)
            .ok_or_else(|| ClientError::NotFound(format!("{table}/{id}")))?;
        let before = rows.len();
        rows.retain(|r| field_str(r, "sys_id") != id);
        if rows.len() == before {
            return Err(ClientError::NotFound(format!("{table}/{id}")));
        }
        Ok(true)
    }
}
