//! Filter engine.
//!
//! Evaluates provider query filters against indexed users. Supported shapes:
//! equality on `userName`/`id` (case-sensitive), equality on
//! `name.givenName`/`name.familyName` via the sub-attribute, equality on an
//! extension-schema attribute (case-insensitive), `email` equality
//! (case-insensitive, any of the user's emails), and a disjunction of
//! `email` equalities whose result is the union of the per-sub-filter
//! matches without deduplication.
//!
//! Anything else yields an empty result and a diagnostic log line; the
//! engine never fails a query.

use tracing::debug;

use idbridge_scim::{FilterAttribute, QueryFilter, User};

/// Evaluates query filters against indexed users.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    extension_urn: String,
}

impl FilterEngine {
    /// Create an engine bound to the configured extension schema URN.
    pub fn new(extension_urn: impl Into<String>) -> Self {
        Self {
            extension_urn: extension_urn.into(),
        }
    }

    /// Evaluate a filter over the given users.
    ///
    /// Result order follows the input (index iteration) order, not the
    /// order of sub-filters within a disjunction.
    pub fn evaluate(&self, filter: &QueryFilter, users: &[User]) -> Vec<User> {
        match filter {
            QueryFilter::Equals { attribute, value } => users
                .iter()
                .filter(|user| self.matches_equality(user, attribute, value))
                .cloned()
                .collect(),
            QueryFilter::Or { expressions } => self.by_disjunction(expressions, users),
        }
    }

    /// Union of the per-sub-filter matches. Only `email` equality
    /// sub-filters are supported; matches are not deduplicated, so a user
    /// matched by two sub-filters appears twice.
    fn by_disjunction(&self, expressions: &[QueryFilter], users: &[User]) -> Vec<User> {
        let mut matched = Vec::new();
        for expression in expressions {
            match expression {
                QueryFilter::Equals { attribute, value }
                    if attribute.name.eq_ignore_ascii_case("email") =>
                {
                    matched.extend(
                        users
                            .iter()
                            .filter(|user| any_email_matches(user, value))
                            .cloned(),
                    );
                }
                other => {
                    debug!(?other, "unsupported disjunction sub-filter, contributing no matches");
                }
            }
        }
        matched
    }

    fn matches_equality(&self, user: &User, attribute: &FilterAttribute, value: &str) -> bool {
        let field = attribute.name.as_str();

        if field.eq_ignore_ascii_case("userName") {
            return user.user_name == value;
        }
        if field.eq_ignore_ascii_case("id") {
            return user.id.as_deref() == Some(value);
        }
        if field.eq_ignore_ascii_case("name") {
            // Nested path: only the two name parts are addressable. A filter
            // lacking the sub-attribute matches nothing.
            return match attribute.sub_attribute.as_deref() {
                Some(sub) if sub.eq_ignore_ascii_case("familyName") => {
                    user.name.family_name.as_deref() == Some(value)
                }
                Some(sub) if sub.eq_ignore_ascii_case("givenName") => {
                    user.name.given_name.as_deref() == Some(value)
                }
                _ => false,
            };
        }
        if field.eq_ignore_ascii_case("email") {
            return any_email_matches(user, value);
        }
        if let Some(schema) = attribute.schema.as_deref() {
            if schema.eq_ignore_ascii_case(&self.extension_urn) {
                return user
                    .custom_property(&self.extension_urn, field)
                    .is_some_and(|v| v.eq_ignore_ascii_case(value));
            }
        }

        debug!(
            field,
            schema = attribute.schema.as_deref().unwrap_or(""),
            "unsupported equality filter field, matching nothing"
        );
        false
    }
}

fn any_email_matches(user: &User, value: &str) -> bool {
    user.emails
        .iter()
        .any(|email| email.value.eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use idbridge_scim::{Email, Name};

    const URN: &str = "urn:scim:idbridge:1.0:user:custom";

    fn engine() -> FilterEngine {
        FilterEngine::new(URN)
    }

    fn user(id: &str, user_name: &str, email: &str) -> User {
        let mut user = User::new(user_name);
        user.id = Some(id.to_string());
        user.emails = vec![Email::new(email, "work", true)];
        user
    }

    fn sample_users() -> Vec<User> {
        let mut alice = user("1", "alice", "a@x.com");
        alice.name = Name::new("Alice Smith", "Alice", "Smith");
        alice.set_custom_property(URN, "departmentName", "R&D");

        let mut bob = user("2", "bob", "b@x.com");
        bob.name = Name::new("Bob Jones", "Bob", "Jones");

        vec![alice, bob]
    }

    #[test]
    fn test_username_equality_is_case_sensitive() {
        let users = sample_users();
        let matched = engine().evaluate(&QueryFilter::eq("userName", "alice"), &users);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].user_name, "alice");

        let matched = engine().evaluate(&QueryFilter::eq("userName", "Alice"), &users);
        assert!(matched.is_empty());
    }

    #[test]
    fn test_id_equality() {
        let users = sample_users();
        let matched = engine().evaluate(&QueryFilter::eq("id", "2"), &users);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].user_name, "bob");
    }

    #[test]
    fn test_name_sub_attribute_equality() {
        let users = sample_users();
        let matched = engine().evaluate(&QueryFilter::eq_sub("name", "familyName", "Smith"), &users);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].user_name, "alice");

        let matched = engine().evaluate(&QueryFilter::eq_sub("name", "givenName", "Bob"), &users);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].user_name, "bob");
    }

    #[test]
    fn test_name_filter_without_sub_attribute_matches_nothing() {
        let users = sample_users();
        let matched = engine().evaluate(&QueryFilter::eq("name", "Alice Smith"), &users);
        assert!(matched.is_empty());
    }

    #[test]
    fn test_custom_schema_equality_is_case_insensitive() {
        let users = sample_users();
        let matched = engine().evaluate(
            &QueryFilter::eq_custom(URN, "departmentName", "r&d"),
            &users,
        );
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].user_name, "alice");
    }

    #[test]
    fn test_custom_schema_with_wrong_urn_matches_nothing() {
        let users = sample_users();
        let matched = engine().evaluate(
            &QueryFilter::eq_custom("urn:other:schema", "departmentName", "R&D"),
            &users,
        );
        assert!(matched.is_empty());
    }

    #[test]
    fn test_email_or_filter_returns_both_users() {
        let users = sample_users();
        let filter = QueryFilter::or(vec![
            QueryFilter::eq("email", "a@x.com"),
            QueryFilter::eq("email", "b@x.com"),
        ]);

        let matched = engine().evaluate(&filter, &users);
        assert_eq!(matched.len(), 2);
        let mut names: Vec<&str> = matched.iter().map(|u| u.user_name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_email_match_is_case_insensitive() {
        let users = sample_users();
        let matched = engine().evaluate(&QueryFilter::eq("email", "A@X.COM"), &users);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].user_name, "alice");
    }

    #[test]
    fn test_or_filter_does_not_deduplicate() {
        let users = sample_users();
        let filter = QueryFilter::or(vec![
            QueryFilter::eq("email", "a@x.com"),
            QueryFilter::eq("email", "A@X.com"),
        ]);

        // Both sub-filters match the same user; the union keeps both hits.
        let matched = engine().evaluate(&filter, &users);
        assert_eq!(matched.len(), 2);
        assert!(matched.iter().all(|u| u.user_name == "alice"));
    }

    #[test]
    fn test_or_filter_ignores_non_email_sub_filters() {
        let users = sample_users();
        let filter = QueryFilter::or(vec![
            QueryFilter::eq("userName", "alice"),
            QueryFilter::eq("email", "b@x.com"),
        ]);

        let matched = engine().evaluate(&filter, &users);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].user_name, "bob");
    }

    #[test]
    fn test_unsupported_field_matches_nothing() {
        let users = sample_users();
        let matched = engine().evaluate(&QueryFilter::eq("title", "Engineer"), &users);
        assert!(matched.is_empty());
    }
}
