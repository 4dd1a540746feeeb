//! # idbridge provisioning core
//!
//! The authoritative in-memory side of the connector:
//!
//! - [`index`] - the [`EntityIndex`](index::EntityIndex), source of truth
//!   for all reads, rebuilt from the directory at startup
//! - [`filter`] - the [`FilterEngine`](filter::FilterEngine) answering
//!   equality and disjunctive queries against indexed users
//! - [`service`] - the [`ProvisioningService`](service::ProvisioningService)
//!   façade the provider-facing layer calls into
//!
//! The directory is write-through, not read-through: mutations flow to the
//! directory gateway and the index in the same logical step, while queries
//! are answered from the index alone.

pub mod filter;
pub mod index;
pub mod service;

pub use filter::FilterEngine;
pub use index::EntityIndex;
pub use service::ProvisioningService;
