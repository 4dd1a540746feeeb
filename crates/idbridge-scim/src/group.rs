//! Group resource model.

use serde::{Deserialize, Serialize};

/// Group member reference.
///
/// A weak reference: the member is identified by its user id plus a cached
/// display name. Deleting the referenced user does not touch memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    /// Member user id.
    pub value: String,

    /// Member display name, cached at assignment time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Membership {
    /// Create a membership reference.
    pub fn new(value: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display: Some(display.into()),
        }
    }
}

/// A provisioned group.
///
/// Display names are unique among all groups, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Opaque, provider-visible identifier. Absent until assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Group display name.
    pub display_name: String,

    /// Group members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Membership>,
}

impl Group {
    /// Create a new group with required fields.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: None,
            display_name: display_name.into(),
            members: vec![],
        }
    }

    /// Add a member.
    #[must_use]
    pub fn with_member(mut self, member: Membership) -> Self {
        self.members.push(member);
        self
    }

    /// Get member ids.
    #[must_use]
    pub fn member_ids(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.value.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_new() {
        let group = Group::new("engineering");
        assert_eq!(group.display_name, "engineering");
        assert!(group.id.is_none());
        assert!(group.members.is_empty());
    }

    #[test]
    fn test_member_ids() {
        let group = Group::new("engineering")
            .with_member(Membership::new("100", "Alice Smith"))
            .with_member(Membership::new("101", "Bob Jones"));
        assert_eq!(group.member_ids(), vec!["100", "101"]);
    }

    #[test]
    fn test_group_serialization() {
        let group = Group::new("engineering").with_member(Membership::new("100", "Alice Smith"));
        let json = serde_json::to_string(&group).unwrap();
        let parsed: Group = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, group);
    }
}
