//! nowguard core - the governed gateway
//!
//! Composes the policy engine, workflow state and investigations into one
//! service object over a [`RemoteDataClient`](nowguard_client::RemoteDataClient):
//! - Governed reads: deny-list, row caps, date filters, masking
//! - Two-step writes: preview/apply and seed/cleanup
//! - Developer actions: artifact toggles and property changes
//! - Investigations run through a read-only [`GuardedClient`]
//!
//! # Example
//!
//! ```rust,ignore
//! use nowguard_core::{Envelope, Gateway, GatewayConfig};
//!
//! # async fn example(client: impl nowguard_client::RemoteDataClient) -> Result<(), nowguard_core::GatewayError> {
//! nowguard_core::logging::init("nowguard_core=info");
//! let config = GatewayConfig::from_path("nowguard.toml")?.from_env()?;
//! let gateway = Gateway::new(config, client);
//!
//! let preview = gateway
//!     .preview_update("incident", "abc123", nowguard_core::parse_changes(r#"{"state": "2"}"#)?, false)
//!     .await?;
//! let applied = gateway.apply_update(&preview.token).await;
//! println!("{}", serde_json::to_string(&Envelope::from_result(&applied)).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod artifacts;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod guarded;
pub mod logging;

pub use artifacts::ArtifactType;
pub use config::{GatewayConfig, StateConfig};
pub use envelope::{Envelope, ErrorBody, Status};
pub use error::{GatewayError, Result};
pub use gateway::{
    parse_changes, parse_records, AppliedUpdate, CleanupReport, FieldChange, Gateway,
    GovernedPage, PropertyChange, SeedReport, ToggleReport, UpdatePreview,
};
pub use guarded::GuardedClient;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
