//! Attribute codec.
//!
//! Bidirectional translation between the normalized entity model and LDAP
//! attribute sets. Multi-valued fields are packed into single directory
//! attributes using a fixed delimiter per field:
//!
//! - phone number: `value,primary,type` (comma-joined) in `telephoneNumber`
//! - email: `value|type|primary` (pipe-joined) in `mail`
//! - membership: `id|displayName` (pipe-joined) in `memberUid`
//!
//! No escaping is performed, so the delimiter is forbidden in the packed
//! values: `,` must not appear in phone values or types, `|` must not appear
//! in email values/types or member ids/display names. Encoding rejects a
//! value containing its field delimiter with a format error; decoding
//! rejects a packed value with too few segments the same way. A malformed
//! record aborts only itself: the rest of the entity still decodes, with the
//! offending raw value logged.
//!
//! Extension-schema (custom) properties are held in the index only and are
//! not projected into the directory.

use tracing::warn;

use idbridge_connector::entry::EntryAttributes;
use idbridge_connector::error::{ConnectorError, ConnectorResult};
use idbridge_scim::{Email, Group, Membership, Name, PhoneNumber, User};

pub(crate) const ATTR_OBJECT_CLASS: &str = "objectClass";
pub(crate) const ATTR_UID: &str = "uid";
pub(crate) const ATTR_SURNAME: &str = "sn";
pub(crate) const ATTR_GIVEN_NAME: &str = "givenName";
pub(crate) const ATTR_DISPLAY_NAME: &str = "displayName";
pub(crate) const ATTR_DESCRIPTION: &str = "description";
pub(crate) const ATTR_PASSWORD: &str = "userPassword";
pub(crate) const ATTR_PHONE: &str = "telephoneNumber";
pub(crate) const ATTR_MAIL: &str = "mail";
pub(crate) const ATTR_CN: &str = "cn";
pub(crate) const ATTR_MEMBER: &str = "memberUid";
pub(crate) const ATTR_GID_NUMBER: &str = "gidNumber";

const USER_OBJECT_CLASSES: [&str; 2] = ["OpenLDAPperson", "shadowAccount"];
const GROUP_OBJECT_CLASSES: [&str; 1] = ["posixGroup"];
const GROUP_GID_NUMBER: &str = "5000";

const PHONE_DELIMITER: char = ',';
const MAIL_DELIMITER: char = '|';
const MEMBER_DELIMITER: char = '|';

/// Fallback for the optional type segment of emails and phone numbers.
const DEFAULT_TYPE: &str = "other";

/// Convert a user into its directory attribute set.
///
/// Fails with a format error if any packed value contains its field
/// delimiter; the entity is not partially encoded.
pub fn user_to_attributes(user: &User) -> ConnectorResult<EntryAttributes> {
    let mut attrs = EntryAttributes::new();
    attrs.set_all(
        ATTR_OBJECT_CLASS,
        USER_OBJECT_CLASSES.iter().map(ToString::to_string).collect(),
    );
    attrs.set(ATTR_UID, user.user_name.clone());

    if let Some(id) = &user.id {
        attrs.set(ATTR_DESCRIPTION, id.clone());
    }
    if let Some(formatted) = &user.name.formatted {
        attrs.set(ATTR_DISPLAY_NAME, formatted.clone());
    }
    if let Some(given) = &user.name.given_name {
        attrs.set(ATTR_GIVEN_NAME, given.clone());
    }
    if let Some(family) = &user.name.family_name {
        attrs.set(ATTR_SURNAME, family.clone());
    }
    if let Some(password) = &user.password {
        attrs.set(ATTR_PASSWORD, password.clone());
    }

    for phone in &user.phone_numbers {
        attrs.add(ATTR_PHONE, pack_phone(phone)?);
    }
    for email in &user.emails {
        attrs.add(ATTR_MAIL, pack_email(email)?);
    }

    Ok(attrs)
}

/// Reconstruct a user from its directory attribute set.
///
/// `uid` and `description` (the entity id) are required; a malformed packed
/// phone or email entry is logged and skipped without failing the decode.
pub fn user_from_attributes(attrs: &EntryAttributes) -> ConnectorResult<User> {
    let user_name = required(attrs, ATTR_UID)?;
    let id = required(attrs, ATTR_DESCRIPTION)?;

    let mut user = User::new(user_name);
    user.id = Some(id.to_string());
    user.active = true;
    user.name = Name {
        formatted: attrs.get_first(ATTR_DISPLAY_NAME).map(ToString::to_string),
        given_name: attrs.get_first(ATTR_GIVEN_NAME).map(ToString::to_string),
        family_name: attrs.get_first(ATTR_SURNAME).map(ToString::to_string),
    };
    user.password = attrs.get_first(ATTR_PASSWORD).map(ToString::to_string);

    for raw in attrs.get_all(ATTR_PHONE) {
        match parse_phone(raw) {
            Ok(phone) => user.phone_numbers.push(phone),
            Err(err) => warn!(attribute = ATTR_PHONE, raw = %raw, error = %err, "skipping malformed phone entry"),
        }
    }
    for raw in attrs.get_all(ATTR_MAIL) {
        match parse_email(raw) {
            Ok(email) => user.emails.push(email),
            Err(err) => warn!(attribute = ATTR_MAIL, raw = %raw, error = %err, "skipping malformed email entry"),
        }
    }

    Ok(user)
}

/// Convert a group into its directory attribute set.
pub fn group_to_attributes(group: &Group) -> ConnectorResult<EntryAttributes> {
    let mut attrs = EntryAttributes::new();
    attrs.set_all(
        ATTR_OBJECT_CLASS,
        GROUP_OBJECT_CLASSES.iter().map(ToString::to_string).collect(),
    );
    attrs.set(ATTR_CN, group.display_name.clone());
    attrs.set(ATTR_GID_NUMBER, GROUP_GID_NUMBER);

    if let Some(id) = &group.id {
        attrs.set(ATTR_DESCRIPTION, id.clone());
    }

    for member in &group.members {
        attrs.add(ATTR_MEMBER, pack_membership(member)?);
    }

    Ok(attrs)
}

/// Reconstruct a group from its directory attribute set.
///
/// `cn` and `description` (the entity id) are required; a malformed packed
/// membership entry is logged and skipped without failing the decode.
pub fn group_from_attributes(attrs: &EntryAttributes) -> ConnectorResult<Group> {
    let display_name = required(attrs, ATTR_CN)?;
    let id = required(attrs, ATTR_DESCRIPTION)?;

    let mut group = Group::new(display_name);
    group.id = Some(id.to_string());

    for raw in attrs.get_all(ATTR_MEMBER) {
        match parse_membership(raw) {
            Ok(member) => group.members.push(member),
            Err(err) => warn!(attribute = ATTR_MEMBER, raw = %raw, error = %err, "skipping malformed membership entry"),
        }
    }

    Ok(group)
}

fn required<'a>(attrs: &'a EntryAttributes, name: &str) -> ConnectorResult<&'a str> {
    attrs
        .get_first(name)
        .ok_or_else(|| ConnectorError::format(name, "(missing)"))
}

fn reject_delimiter(attribute: &str, value: &str, delimiter: char) -> ConnectorResult<()> {
    if value.contains(delimiter) {
        return Err(ConnectorError::format(attribute, value));
    }
    Ok(())
}

fn pack_phone(phone: &PhoneNumber) -> ConnectorResult<String> {
    let number_type = phone.number_type.as_deref().unwrap_or(DEFAULT_TYPE);
    reject_delimiter(ATTR_PHONE, &phone.value, PHONE_DELIMITER)?;
    reject_delimiter(ATTR_PHONE, number_type, PHONE_DELIMITER)?;
    Ok(format!("{},{},{}", phone.value, phone.primary, number_type))
}

fn parse_phone(raw: &str) -> ConnectorResult<PhoneNumber> {
    let parts: Vec<&str> = raw.split(PHONE_DELIMITER).collect();
    if parts.len() < 3 {
        return Err(ConnectorError::format(ATTR_PHONE, raw));
    }
    Ok(PhoneNumber {
        value: parts[0].to_string(),
        number_type: Some(parts[2].to_string()),
        primary: parts[1].eq_ignore_ascii_case("true"),
    })
}

fn pack_email(email: &Email) -> ConnectorResult<String> {
    let email_type = email.email_type.as_deref().unwrap_or(DEFAULT_TYPE);
    reject_delimiter(ATTR_MAIL, &email.value, MAIL_DELIMITER)?;
    reject_delimiter(ATTR_MAIL, email_type, MAIL_DELIMITER)?;
    Ok(format!("{}|{}|{}", email.value, email_type, email.primary))
}

fn parse_email(raw: &str) -> ConnectorResult<Email> {
    let parts: Vec<&str> = raw.split(MAIL_DELIMITER).collect();
    if parts.len() < 3 {
        return Err(ConnectorError::format(ATTR_MAIL, raw));
    }
    Ok(Email {
        value: parts[0].to_string(),
        email_type: Some(parts[1].to_string()),
        primary: parts[2].eq_ignore_ascii_case("true"),
    })
}

fn pack_membership(member: &Membership) -> ConnectorResult<String> {
    let display = member.display.as_deref().unwrap_or("");
    reject_delimiter(ATTR_MEMBER, &member.value, MEMBER_DELIMITER)?;
    reject_delimiter(ATTR_MEMBER, display, MEMBER_DELIMITER)?;
    Ok(format!("{}|{}", member.value, display))
}

fn parse_membership(raw: &str) -> ConnectorResult<Membership> {
    let parts: Vec<&str> = raw.split(MEMBER_DELIMITER).collect();
    if parts.len() < 2 {
        return Err(ConnectorError::format(ATTR_MEMBER, raw));
    }
    Ok(Membership {
        value: parts[0].to_string(),
        display: Some(parts[1].to_string()),
    })
}
