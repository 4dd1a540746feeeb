//! Connector error taxonomy.
//!
//! Error definitions with classification helpers and stable codes.

use thiserror::Error;

use crate::types::EntityKind;

/// Error that can occur during connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Lookup by id failed. Part of the normal operation contract; always
    /// returned to the caller.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Group display-name collision (compared case-insensitively). Part of
    /// the normal operation contract; always returned to the caller.
    #[error("duplicate group display name: {display_name}")]
    DuplicateGroup { display_name: String },

    /// Malformed packed multi-valued field encountered during decode, or a
    /// value containing its field delimiter during encode.
    #[error("malformed value for attribute '{attribute}': {raw}")]
    Format { attribute: String, raw: String },

    /// Directory operation failure.
    #[error("directory operation failed: {message}")]
    Directory {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Directory operation exceeded its deadline.
    #[error("directory operation timed out after {timeout_secs} seconds")]
    DirectoryTimeout { timeout_secs: u64 },

    /// Generic operational failure with a caller-supplied code and an
    /// optional help reference.
    #[error("management error [{code}]: {message}")]
    Management {
        code: String,
        message: String,
        help_url: Option<String>,
    },

    /// Connector configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl ConnectorError {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConnectorError::NotFound { .. })
    }

    /// Check if this is a directory-side failure (including timeouts).
    ///
    /// Directory failures during writes are logged and absorbed by the
    /// provisioning service; the index mutation proceeds regardless.
    pub fn is_directory(&self) -> bool {
        matches!(
            self,
            ConnectorError::Directory { .. } | ConnectorError::DirectoryTimeout { .. }
        )
    }

    /// Check if this is a per-record decode failure.
    pub fn is_format(&self) -> bool {
        matches!(self, ConnectorError::Format { .. })
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::NotFound { .. } => "NOT_FOUND",
            ConnectorError::DuplicateGroup { .. } => "DUPLICATE_GROUP",
            ConnectorError::Format { .. } => "FORMAT_ERROR",
            ConnectorError::Directory { .. } => "DIRECTORY_ERROR",
            ConnectorError::DirectoryTimeout { .. } => "DIRECTORY_TIMEOUT",
            ConnectorError::Management { .. } => "MANAGEMENT_ERROR",
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
        }
    }

    // Convenience constructors

    /// Create a not-found error.
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        ConnectorError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a duplicate-group error.
    pub fn duplicate_group(display_name: impl Into<String>) -> Self {
        ConnectorError::DuplicateGroup {
            display_name: display_name.into(),
        }
    }

    /// Create a format error for a malformed packed value.
    pub fn format(attribute: impl Into<String>, raw: impl Into<String>) -> Self {
        ConnectorError::Format {
            attribute: attribute.into(),
            raw: raw.into(),
        }
    }

    /// Create a directory error.
    pub fn directory(message: impl Into<String>) -> Self {
        ConnectorError::Directory {
            message: message.into(),
            source: None,
        }
    }

    /// Create a directory error with source.
    pub fn directory_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Directory {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a management error.
    pub fn management(code: impl Into<String>, message: impl Into<String>) -> Self {
        ConnectorError::Management {
            code: code.into(),
            message: message.into(),
            help_url: None,
        }
    }

    /// Create a management error carrying a help reference.
    pub fn management_with_help(
        code: impl Into<String>,
        message: impl Into<String>,
        help_url: impl Into<String>,
    ) -> Self {
        ConnectorError::Management {
            code: code.into(),
            message: message.into(),
            help_url: Some(help_url.into()),
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
