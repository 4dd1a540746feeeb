//! Pagination request and list-response envelopes.

use serde::{Deserialize, Serialize};

use crate::group::Group;
use crate::user::User;

/// Pagination parameters supplied by the provider.
///
/// The start index is 1-based, following SCIM list-response conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// 1-based index of the first requested result.
    pub start_index: usize,

    /// Maximum number of results the provider asked for.
    pub count: usize,
}

impl PageRequest {
    /// Create a page request.
    pub fn new(start_index: usize, count: usize) -> Self {
        Self { start_index, count }
    }
}

/// Response envelope for user list/query operations.
///
/// `total_results` reflects the full match count. Results are not sliced to
/// the requested page; the start index is echoed back as received.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQueryResponse {
    /// Total number of matching users.
    pub total_results: usize,

    /// 1-based start index echoed from the request (1 when absent).
    pub start_index: usize,

    /// The matching users.
    pub resources: Vec<User>,
}

/// Response envelope for group list operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupQueryResponse {
    /// Total number of groups.
    pub total_results: usize,

    /// 1-based start index echoed from the request (1 when absent).
    pub start_index: usize,

    /// The groups.
    pub resources: Vec<Group>,
}
