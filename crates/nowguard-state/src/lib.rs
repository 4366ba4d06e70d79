//! nowguard state - short-lived workflow state
//!
//! Turns two-step writes into safe transactions without a backing store:
//! - [`PreviewTokenStore`]: expiring, single-use tokens for preview -> apply
//! - [`SeedLedger`]: records created under a tag, for seed -> cleanup
//! - [`WorkflowState`]: the service object owning both
//!
//! All maps are safe for concurrent use. Critical sections are single map
//! operations; nothing here awaits while holding a lock.

#![warn(unreachable_pub)]

pub mod error;
pub mod ledger;
pub mod preview;
pub mod workflow;

pub use error::StateError;
pub use ledger::{SeedEntry, SeedLedger};
pub use preview::{PreviewToken, PreviewTokenStore, DEFAULT_PREVIEW_TTL};
pub use workflow::{PendingUpdate, WorkflowState};
