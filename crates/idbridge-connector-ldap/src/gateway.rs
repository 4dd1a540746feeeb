//! LDAP directory gateway.
//!
//! One connection per operation: connect, bind, operate, unbind. No pooling
//! and no retry; every operation is bounded by the configured deadline and
//! expiry surfaces as a directory timeout.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, info, instrument, warn};

use idbridge_connector::entry::EntryAttributes;
use idbridge_connector::error::{ConnectorError, ConnectorResult};
use idbridge_connector::traits::DirectoryGateway;
use idbridge_connector::types::EntityKind;

use crate::config::LdapConfig;

/// LDAP result code for "no such object".
const RC_NO_SUCH_OBJECT: u32 = 32;

/// LDAP result code for "entry already exists".
const RC_ALREADY_EXISTS: u32 = 68;

/// Directory gateway backed by an LDAP server.
pub struct LdapGateway {
    config: LdapConfig,
}

impl LdapGateway {
    /// Create a gateway with the given configuration.
    pub fn new(config: LdapConfig) -> ConnectorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Compute the DN locating an entity's entry.
    ///
    /// The naming value (username for users, display name for groups) is
    /// escaped per RFC 4514 before being placed in the RDN.
    pub fn entry_dn(&self, kind: EntityKind, naming: &str) -> String {
        let (rdn_attribute, container_dn) = match kind {
            EntityKind::User => (&self.config.user_rdn_attribute, self.config.user_dn()),
            EntityKind::Group => (&self.config.group_rdn_attribute, self.config.group_dn()),
        };
        format!(
            "{}={},{}",
            rdn_attribute,
            escape_dn_value(naming),
            container_dn
        )
    }

    /// Verify connectivity by binding and reading the base entry.
    pub async fn test_connection(&self) -> ConnectorResult<()> {
        self.bounded(async {
            let mut ldap = self.connect().await?;
            let outcome = ldap
                .search(&self.config.base_dn, Scope::Base, "(objectClass=*)", vec!["dn"])
                .await;
            Self::close(ldap).await;

            outcome
                .map_err(|e| ConnectorError::directory_with_source("base search failed", e))?
                .success()
                .map_err(|e| ConnectorError::directory(format!("base search failed: {e:?}")))?;
            info!(host = %self.config.host, "directory connection test successful");
            Ok(())
        })
        .await
    }

    /// Open a fresh connection and bind.
    async fn connect(&self) -> ConnectorResult<Ldap> {
        let url = self.config.url();
        debug!(url = %url, "connecting to directory");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.connection_timeout_secs))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                ConnectorError::directory_with_source(
                    format!("failed to connect to directory at {url}"),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "directory connection driver error");
            }
        });

        let bind_password = self.config.bind_password.as_deref().unwrap_or("");
        let result = ldap
            .simple_bind(&self.config.bind_dn, bind_password)
            .await
            .map_err(|e| {
                ConnectorError::directory_with_source(
                    format!("bind failed for {}", self.config.bind_dn),
                    e,
                )
            })?;

        if result.rc != 0 {
            return Err(ConnectorError::directory(format!(
                "bind failed with code {}: {}",
                result.rc, result.text
            )));
        }

        Ok(ldap)
    }

    /// Unbind, tolerating failures.
    async fn close(mut ldap: Ldap) {
        if let Err(e) = ldap.unbind().await {
            warn!(error = %e, "error during directory unbind");
        }
    }

    /// Bound a directory round-trip by the configured operation deadline.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = ConnectorResult<T>>,
    ) -> ConnectorResult<T> {
        let timeout_secs = self.config.operation_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(timeout_secs), fut).await {
            Ok(result) => result,
            Err(_) => Err(ConnectorError::DirectoryTimeout { timeout_secs }),
        }
    }

    /// Add an entry on an open connection.
    async fn add_entry(
        ldap: &mut Ldap,
        dn: &str,
        attrs: &EntryAttributes,
    ) -> ConnectorResult<()> {
        let ldap_attrs: Vec<(&str, HashSet<&str>)> = attrs
            .iter()
            .map(|(name, values)| {
                (
                    name.as_str(),
                    values.iter().map(String::as_str).collect::<HashSet<&str>>(),
                )
            })
            .collect();

        let result = ldap.add(dn, ldap_attrs).await.map_err(|e| {
            ConnectorError::directory_with_source(format!("failed to create entry: {dn}"), e)
        })?;

        if result.rc == RC_ALREADY_EXISTS {
            return Err(ConnectorError::directory(format!(
                "entry already exists: {dn}"
            )));
        }
        if result.rc != 0 {
            return Err(ConnectorError::directory(format!(
                "add failed with code {}: {}",
                result.rc, result.text
            )));
        }
        Ok(())
    }

    /// Delete an entry on an open connection.
    ///
    /// A missing entry is reported through `missing_is_error`: the replace
    /// path treats it as a no-op, the delete path as a failure.
    async fn remove_entry(
        ldap: &mut Ldap,
        dn: &str,
        missing_is_error: bool,
    ) -> ConnectorResult<()> {
        let result = ldap.delete(dn).await.map_err(|e| {
            ConnectorError::directory_with_source(format!("failed to delete entry: {dn}"), e)
        })?;

        if result.rc == RC_NO_SUCH_OBJECT {
            if missing_is_error {
                return Err(ConnectorError::directory(format!("no such entry: {dn}")));
            }
            debug!(dn = %dn, "entry to replace was absent, continuing");
            return Ok(());
        }
        if result.rc != 0 {
            return Err(ConnectorError::directory(format!(
                "delete failed with code {}: {}",
                result.rc, result.text
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryGateway for LdapGateway {
    #[instrument(skip(self, attrs), fields(host = %self.config.host))]
    async fn create_entry(
        &self,
        kind: EntityKind,
        naming: &str,
        attrs: &EntryAttributes,
    ) -> ConnectorResult<()> {
        let dn = self.entry_dn(kind, naming);
        self.bounded(async {
            let mut ldap = self.connect().await?;
            let outcome = Self::add_entry(&mut ldap, &dn, attrs).await;
            Self::close(ldap).await;
            outcome?;
            info!(dn = %dn, "directory entry created");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, attrs), fields(host = %self.config.host))]
    async fn replace_entry(
        &self,
        kind: EntityKind,
        old_naming: &str,
        new_naming: &str,
        attrs: &EntryAttributes,
    ) -> ConnectorResult<()> {
        let old_dn = self.entry_dn(kind, old_naming);
        let new_dn = self.entry_dn(kind, new_naming);
        // Delete-then-create, not an atomic rename: a failure after the
        // delete leaves no entry until the next successful write.
        self.bounded(async {
            let mut ldap = self.connect().await?;
            let outcome = async {
                Self::remove_entry(&mut ldap, &old_dn, false).await?;
                Self::add_entry(&mut ldap, &new_dn, attrs).await
            }
            .await;
            Self::close(ldap).await;
            outcome?;
            info!(old_dn = %old_dn, new_dn = %new_dn, "directory entry replaced");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(host = %self.config.host))]
    async fn delete_entry(&self, kind: EntityKind, naming: &str) -> ConnectorResult<()> {
        let dn = self.entry_dn(kind, naming);
        self.bounded(async {
            let mut ldap = self.connect().await?;
            let outcome = Self::remove_entry(&mut ldap, &dn, true).await;
            Self::close(ldap).await;
            outcome?;
            info!(dn = %dn, "directory entry deleted");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(host = %self.config.host))]
    async fn search_entries(&self, kind: EntityKind) -> ConnectorResult<Vec<EntryAttributes>> {
        let (base_dn, filter) = match kind {
            EntityKind::User => (self.config.user_dn(), self.config.user_filter.clone()),
            EntityKind::Group => (self.config.group_dn(), self.config.group_filter.clone()),
        };

        self.bounded(async {
            let mut ldap = self.connect().await?;
            let outcome = ldap
                .search(&base_dn, Scope::Subtree, &filter, vec!["*"])
                .await;
            Self::close(ldap).await;

            let (entries, _res) = outcome
                .map_err(|e| ConnectorError::directory_with_source("search failed", e))?
                .success()
                .map_err(|e| ConnectorError::directory(format!("search failed: {e:?}")))?;

            let attr_sets: Vec<EntryAttributes> = entries
                .into_iter()
                .map(SearchEntry::construct)
                .map(entry_to_attributes)
                .collect();

            info!(kind = %kind, count = attr_sets.len(), "directory scan complete");
            Ok(attr_sets)
        })
        .await
    }
}

/// Convert an LDAP search entry into an attribute set.
///
/// Binary attribute values (e.g. `userPassword` on some servers) are taken
/// as UTF-8.
fn entry_to_attributes(entry: SearchEntry) -> EntryAttributes {
    let mut attrs = EntryAttributes::new();
    for (name, values) in entry.attrs {
        attrs.set_all(name, values);
    }
    for (name, values) in entry.bin_attrs {
        let values = values
            .into_iter()
            .map(|v| String::from_utf8_lossy(&v).into_owned())
            .collect();
        attrs.set_all(name, values);
    }
    attrs
}

/// Escape special characters in a DN attribute value per RFC 4514.
///
/// Escaped: `, + " \ < > ; =` everywhere, NUL as `\00`, space at either end,
/// `#` at the start.
fn escape_dn_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let last = chars.len().saturating_sub(1);
    let mut result = String::with_capacity(value.len() * 2);

    for (i, ch) in chars.iter().copied().enumerate() {
        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                result.push('\\');
                result.push(ch);
            }
            '\0' => result.push_str("\\00"),
            ' ' if i == 0 || i == last => result.push_str("\\20"),
            '#' if i == 0 => result.push_str("\\23"),
            _ => result.push(ch),
        }
    }

    result
}

impl std::fmt::Debug for LdapGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapGateway")
            .field("config", &self.config.redacted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> LdapGateway {
        LdapGateway::new(LdapConfig::new(
            "ldap.example.com",
            "dc=example,dc=com",
            "cn=admin,dc=example,dc=com",
        ))
        .unwrap()
    }

    #[test]
    fn test_user_entry_dn() {
        assert_eq!(
            gateway().entry_dn(EntityKind::User, "alice"),
            "uid=alice,ou=users,dc=example,dc=com"
        );
    }

    #[test]
    fn test_group_entry_dn() {
        assert_eq!(
            gateway().entry_dn(EntityKind::Group, "engineering"),
            "cn=engineering,ou=groups,dc=example,dc=com"
        );
    }

    #[test]
    fn test_entry_dn_escapes_naming_value() {
        assert_eq!(
            gateway().entry_dn(EntityKind::User, "smith, alice"),
            "uid=smith\\, alice,ou=users,dc=example,dc=com"
        );
    }

    #[test]
    fn test_escape_dn_value_specials() {
        assert_eq!(escape_dn_value("a,b"), "a\\,b");
        assert_eq!(escape_dn_value("a+b<c>"), "a\\+b\\<c\\>");
        assert_eq!(escape_dn_value("a=b"), "a\\=b");
        assert_eq!(escape_dn_value("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_escape_dn_value_edges() {
        assert_eq!(escape_dn_value(" padded "), "\\20padded\\20");
        assert_eq!(escape_dn_value("#leading"), "\\23leading");
        assert_eq!(escape_dn_value("mid#dle"), "mid#dle");
        assert_eq!(escape_dn_value(""), "");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = LdapConfig::new("", "dc=example,dc=com", "cn=admin,dc=example,dc=com");
        assert!(LdapGateway::new(config).is_err());
    }

    #[test]
    fn test_entry_to_attributes_merges_binary() {
        let entry = SearchEntry {
            dn: "uid=alice,ou=users,dc=example,dc=com".to_string(),
            attrs: [("uid".to_string(), vec!["alice".to_string()])]
                .into_iter()
                .collect(),
            bin_attrs: [("userPassword".to_string(), vec![b"secret".to_vec()])]
                .into_iter()
                .collect(),
        };
        let attrs = entry_to_attributes(entry);
        assert_eq!(attrs.get_first("uid"), Some("alice"));
        assert_eq!(attrs.get_first("userPassword"), Some("secret"));
    }
}
