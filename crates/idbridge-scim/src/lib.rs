//! # idbridge SCIM model
//!
//! The normalized identity-entity model shared by the connector stack:
//! users, groups, memberships, the query filter model, and the
//! pagination request/response envelopes.
//!
//! These types are the provider-facing shape of the data. They carry no
//! directory semantics; translation to and from directory attribute sets
//! lives in the LDAP binding crate.

pub mod filter;
pub mod group;
pub mod query;
pub mod user;

pub use filter::{FilterAttribute, QueryFilter};
pub use group::{Group, Membership};
pub use query::{GroupQueryResponse, PageRequest, UserQueryResponse};
pub use user::{Email, Name, PhoneNumber, User};
