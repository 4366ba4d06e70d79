//! nowguard client - the remote data capability consumed by the core
//!
//! Provides:
//! - [`RemoteDataClient`], the async trait the transport layer implements
//! - Request/response types for record, query and aggregate calls
//! - [`ClientError`], the transport error taxonomy
//! - [`EncodedQuery`], a builder for `^`-joined filter strings
//!
//! # Example
//!
//! ```rust,ignore
//! use nowguard_client::{QueryRequest, RemoteDataClient};
//!
//! # async fn example(client: &dyn RemoteDataClient) -> Result<(), nowguard_client::ClientError> {
//! let page = client
//!     .query_records(&QueryRequest::new("incident", "active=true").with_limit(10))
//!     .await?;
//! println!("{} of {}", page.records.len(), page.total_count);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod client;
pub mod error;
pub mod query;
pub mod types;

pub use client::{ClientResult, RemoteDataClient};
pub use error::ClientError;
pub use query::EncodedQuery;
pub use types::{
    field_str, AggregateRequest, AggregateStats, GetOptions, QueryPage, QueryRequest, Record,
};

#[cfg(feature = "mock")]
pub use client::MockRemoteDataClient;
