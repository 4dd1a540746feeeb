//! User resource model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User name components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    /// Formatted full name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,

    /// Given name (first name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    /// Family name (last name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

impl Name {
    /// Create a name from its three components.
    pub fn new(
        formatted: impl Into<String>,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
    ) -> Self {
        Self {
            formatted: Some(formatted.into()),
            given_name: Some(given_name.into()),
            family_name: Some(family_name.into()),
        }
    }
}

/// Email address value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    /// Email address.
    pub value: String,

    /// Email type (e.g., "work", "home").
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub email_type: Option<String>,

    /// Whether this is the primary email.
    #[serde(default)]
    pub primary: bool,
}

impl Email {
    /// Create an email entry.
    pub fn new(value: impl Into<String>, email_type: impl Into<String>, primary: bool) -> Self {
        Self {
            value: value.into(),
            email_type: Some(email_type.into()),
            primary,
        }
    }
}

/// Phone number value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    /// Phone number.
    pub value: String,

    /// Number type (e.g., "work", "mobile").
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub number_type: Option<String>,

    /// Whether this is the primary number.
    #[serde(default)]
    pub primary: bool,
}

impl PhoneNumber {
    /// Create a phone number entry.
    pub fn new(value: impl Into<String>, number_type: impl Into<String>, primary: bool) -> Self {
        Self {
            value: value.into(),
            number_type: Some(number_type.into()),
            primary,
        }
    }
}

/// A provisioned user.
///
/// The identifier is assigned by the provisioning service on creation and is
/// immutable afterwards. Username uniqueness is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque, provider-visible identifier. Absent until assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Username.
    pub user_name: String,

    /// Name components.
    #[serde(default)]
    pub name: Name,

    /// Whether the user is active. Inactive users keep their index entry but
    /// have no directory entry.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Write-only secret. Accepted on input, round-tripped internally as an
    /// opaque string, never serialized back out.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,

    /// Email addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<Email>,

    /// Phone numbers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<PhoneNumber>,

    /// Extension schema data, keyed by schema URN at the top level of the
    /// wire form (e.g. `"urn:scim:idbridge:1.0:user:custom": { ... }`).
    #[serde(flatten, default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extensions: serde_json::Map<String, Value>,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Create a new user with required fields.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            id: None,
            user_name: user_name.into(),
            name: Name::default(),
            active: true,
            password: None,
            emails: vec![],
            phone_numbers: vec![],
            extensions: serde_json::Map::new(),
        }
    }

    /// Set the name components.
    #[must_use]
    pub fn with_name(mut self, name: Name) -> Self {
        self.name = name;
        self
    }

    /// Get the primary email address, falling back to the first one.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .find(|e| e.primary)
            .or(self.emails.first())
            .map(|e| e.value.as_str())
    }

    /// Look up a custom property under an extension schema URN.
    ///
    /// Returns the property rendered as text (strings unquoted, other JSON
    /// scalars via their display form), or `None` if the schema or field is
    /// absent.
    #[must_use]
    pub fn custom_property(&self, schema_urn: &str, field: &str) -> Option<String> {
        let bag = self.extensions.get(schema_urn)?.as_object()?;
        match bag.get(field)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a custom property under an extension schema URN.
    pub fn set_custom_property(&mut self, schema_urn: &str, field: &str, value: impl Into<Value>) {
        let bag = self
            .extensions
            .entry(schema_urn.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if let Value::Object(map) = bag {
            map.insert(field.to_string(), value.into());
        }
    }
}
