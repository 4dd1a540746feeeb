//! # idbridge LDAP binding
//!
//! The directory-side half of the connector:
//!
//! - [`codec`] - bidirectional translation between the normalized entity
//!   model and LDAP attribute sets, including the delimiter-packed
//!   multi-valued fields
//! - [`gateway`] - [`LdapGateway`], the
//!   [`DirectoryGateway`](idbridge_connector::traits::DirectoryGateway)
//!   implementation over `ldap3`
//! - [`config`] - LDAP connection and naming configuration

pub mod codec;
pub mod config;
pub mod gateway;

pub use config::LdapConfig;
pub use gateway::LdapGateway;
