//! LDAP connection and naming configuration.

use serde::{Deserialize, Serialize};

use idbridge_connector::error::{ConnectorError, ConnectorResult};

/// Configuration for the LDAP gateway.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// LDAP server hostname or IP address.
    pub host: String,

    /// LDAP server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on a plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Base DN for all operations (e.g., "dc=example,dc=com").
    pub base_dn: String,

    /// Bind DN for authentication (e.g., "cn=admin,dc=example,dc=com").
    pub bind_dn: String,

    /// Bind password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// User container, relative to `base_dn` (e.g., "ou=users").
    #[serde(default = "default_user_container")]
    pub user_container: String,

    /// Group container, relative to `base_dn` (e.g., "ou=groups").
    #[serde(default = "default_group_container")]
    pub group_container: String,

    /// RDN attribute naming user entries.
    #[serde(default = "default_user_rdn_attribute")]
    pub user_rdn_attribute: String,

    /// RDN attribute naming group entries.
    #[serde(default = "default_group_rdn_attribute")]
    pub group_rdn_attribute: String,

    /// LDAP filter selecting user entries during the startup scan.
    #[serde(default = "default_user_filter")]
    pub user_filter: String,

    /// LDAP filter selecting group entries during the startup scan.
    #[serde(default = "default_group_filter")]
    pub group_filter: String,

    /// Connection establishment timeout.
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Deadline for a single directory operation (connect + bind + round
    /// trip). Expiry surfaces as a directory timeout error.
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("user_container", &self.user_container)
            .field("group_container", &self.group_container)
            .field("user_rdn_attribute", &self.user_rdn_attribute)
            .field("group_rdn_attribute", &self.group_rdn_attribute)
            .field("user_filter", &self.user_filter)
            .field("group_filter", &self.group_filter)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .finish()
    }
}

fn default_ldap_port() -> u16 {
    389
}

fn default_user_container() -> String {
    "ou=users".to_string()
}

fn default_group_container() -> String {
    "ou=groups".to_string()
}

fn default_user_rdn_attribute() -> String {
    "uid".to_string()
}

fn default_group_rdn_attribute() -> String {
    "cn".to_string()
}

fn default_user_filter() -> String {
    "(objectClass=OpenLDAPperson)".to_string()
}

fn default_group_filter() -> String {
    "(objectClass=posixGroup)".to_string()
}

fn default_connection_timeout_secs() -> u64 {
    10
}

fn default_operation_timeout_secs() -> u64 {
    30
}

impl LdapConfig {
    /// Create a new LDAP config with required fields.
    pub fn new(
        host: impl Into<String>,
        base_dn: impl Into<String>,
        bind_dn: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_ldap_port(),
            use_ssl: false,
            use_starttls: false,
            base_dn: base_dn.into(),
            bind_dn: bind_dn.into(),
            bind_password: None,
            user_container: default_user_container(),
            group_container: default_group_container(),
            user_rdn_attribute: default_user_rdn_attribute(),
            group_rdn_attribute: default_group_rdn_attribute(),
            user_filter: default_user_filter(),
            group_filter: default_group_filter(),
            connection_timeout_secs: default_connection_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
        }
    }

    /// Set bind password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS).
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Set user container.
    pub fn with_user_container(mut self, container: impl Into<String>) -> Self {
        self.user_container = container.into();
        self
    }

    /// Set group container.
    pub fn with_group_container(mut self, container: impl Into<String>) -> Self {
        self.group_container = container.into();
        self
    }

    /// Get the LDAP URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Get the full user container DN.
    #[must_use]
    pub fn user_dn(&self) -> String {
        format!("{},{}", self.user_container, self.base_dn)
    }

    /// Get the full group container DN.
    #[must_use]
    pub fn group_dn(&self) -> String {
        format!("{},{}", self.group_container, self.base_dn)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.host.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "host is required".to_string(),
            });
        }

        if self.base_dn.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "base_dn is required".to_string(),
            });
        }

        if self.bind_dn.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "bind_dn is required".to_string(),
            });
        }

        if self.use_ssl && self.use_starttls {
            return Err(ConnectorError::InvalidConfiguration {
                message: "cannot use both SSL and STARTTLS".to_string(),
            });
        }

        if self.operation_timeout_secs == 0 {
            return Err(ConnectorError::InvalidConfiguration {
                message: "operation_timeout_secs must be positive".to_string(),
            });
        }

        Ok(())
    }

    /// A clone safe to log: the bind password is replaced.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.bind_password.is_some() {
            config.bind_password = Some("***REDACTED***".to_string());
        }
        config
    }
}
