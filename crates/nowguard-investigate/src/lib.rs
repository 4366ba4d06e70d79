//! nowguard investigate - read-only analytical scans with drill-down
//!
//! Provides:
//! - [`Investigation`], the `run`/`explain` contract every scan implements
//! - [`InvestigationKind`] and [`registry`], a compile-time checked registry
//! - [`dispatch`], name-based entry points that reject unknown names
//! - Seven built-in scans under [`modules`]
//!
//! Sub-queries are either mandatory or optional. A failing optional
//! sub-query is logged and contributes nothing; a failing mandatory one
//! fails the investigation with [`InvestigationError::Client`].
//!
//! # Example
//!
//! ```rust,ignore
//! use nowguard_investigate::{dispatch, InvestigationParams};
//!
//! let params = InvestigationParams::new().with("hours", 6);
//! let result = dispatch::run(&client, "error_analysis", &params).await?;
//! for finding in &result.findings {
//!     let detail = dispatch::explain(&client, "error_analysis", &finding.element_id).await?;
//!     println!("{}", detail.explanation);
//! }
//! ```

#![warn(unreachable_pub)]

mod contrib;
pub mod dispatch;
pub mod element;
pub mod error;
pub mod modules;
pub mod params;
pub mod registry;
pub mod result;

pub use element::ElementId;
pub use error::{InvestigationError, Result};
pub use params::InvestigationParams;
pub use registry::{registry, Investigation, InvestigationKind};
pub use result::{ExplanationResult, Finding, InvestigationResult};
