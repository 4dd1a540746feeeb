//! Connector settings.
//!
//! The configuration collaborator supplies these once at startup; the core
//! treats them as an immutable snapshot.

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ConnectorResult};
use crate::types::IdMode;

fn default_extension_urn() -> String {
    "urn:scim:idbridge:1.0:user:custom".to_string()
}

/// Process-wide connector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSettings {
    /// Extension schema URN under which provider-defined custom user
    /// attributes live.
    #[serde(default = "default_extension_urn")]
    pub extension_urn: String,

    /// Identifier-generation mode.
    #[serde(default)]
    pub id_mode: IdMode,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            extension_urn: default_extension_urn(),
            id_mode: IdMode::default(),
        }
    }
}

impl ConnectorSettings {
    /// Validate the settings.
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.extension_urn.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "extension_urn is required".to_string(),
            });
        }
        if !self.extension_urn.starts_with("urn:") {
            return Err(ConnectorError::InvalidConfiguration {
                message: format!(
                    "extension_urn must be a URN, got '{}'",
                    self.extension_urn
                ),
            });
        }
        Ok(())
    }
}
