//! Query filter model.
//!
//! The provider-facing layer hands filters to the core already parsed; this
//! is the parsed shape. Two forms are modeled: an equality comparison on an
//! attribute path, and a disjunction of sub-filters.

use serde::{Deserialize, Serialize};

/// The attribute path of a filter: an optional schema URN qualifying the
/// attribute, the attribute name, and an optional sub-attribute (e.g.
/// `name.givenName` carries `name` + `givenName`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterAttribute {
    /// Schema URN qualifying the attribute, if any. Filters on extension
    /// schema attributes carry their URN here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Attribute name (e.g. `userName`, `email`, `name`).
    pub name: String,

    /// Sub-attribute name for nested paths (e.g. `givenName`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_attribute: Option<String>,
}

impl FilterAttribute {
    /// A plain attribute path.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            sub_attribute: None,
        }
    }

    /// Qualify the path with a schema URN.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Add a sub-attribute to the path.
    #[must_use]
    pub fn with_sub_attribute(mut self, sub: impl Into<String>) -> Self {
        self.sub_attribute = Some(sub.into());
        self
    }
}

/// A query filter over indexed entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryFilter {
    /// Match entities where the attribute path equals the value.
    Equals {
        attribute: FilterAttribute,
        value: String,
    },

    /// Disjunction: the union of the sub-filter results.
    Or { expressions: Vec<QueryFilter> },
}

impl QueryFilter {
    /// Equality filter on a plain attribute.
    pub fn eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        QueryFilter::Equals {
            attribute: FilterAttribute::new(name),
            value: value.into(),
        }
    }

    /// Equality filter on a nested attribute path (e.g. `name.givenName`).
    pub fn eq_sub(
        name: impl Into<String>,
        sub_attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        QueryFilter::Equals {
            attribute: FilterAttribute::new(name).with_sub_attribute(sub_attribute),
            value: value.into(),
        }
    }

    /// Equality filter on an extension-schema attribute.
    pub fn eq_custom(
        schema: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        QueryFilter::Equals {
            attribute: FilterAttribute::new(name).with_schema(schema),
            value: value.into(),
        }
    }

    /// Disjunction of sub-filters.
    pub fn or(expressions: Vec<QueryFilter>) -> Self {
        QueryFilter::Or { expressions }
    }
}
