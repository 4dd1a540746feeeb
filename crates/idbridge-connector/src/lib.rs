//! # idbridge connector framework
//!
//! Core abstractions shared by the idbridge connector stack:
//!
//! - [`error`] - Error taxonomy with stable codes and classification helpers
//! - [`types`] - Entity kinds and identifier-generation modes
//! - [`entry`] - Directory entry attribute sets
//! - [`traits`] - The [`DirectoryGateway`](traits::DirectoryGateway) capability trait
//! - [`ids`] - Identifier generation (random token or per-kind counters)
//! - [`config`] - The immutable connector settings snapshot
//!
//! The directory binding (LDAP) and the provisioning façade build on these
//! types; neither is defined here.

pub mod config;
pub mod entry;
pub mod error;
pub mod ids;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```
/// use idbridge_connector::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ConnectorSettings;
    pub use crate::entry::EntryAttributes;
    pub use crate::error::{ConnectorError, ConnectorResult};
    pub use crate::ids::IdGenerator;
    pub use crate::traits::DirectoryGateway;
    pub use crate::types::{EntityKind, IdMode};
}

// Re-export async_trait for gateway implementors
pub use async_trait::async_trait;
