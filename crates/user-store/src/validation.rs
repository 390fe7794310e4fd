//! Input validation for user payloads.
//!
//! The record adapter assumes validated input and never calls these itself.
//! Request layers (HTTP handlers, CLI commands) run them before invoking it.
//!
//! ## Email syntax
//!
//! - At most 254 bytes, exactly one `@`.
//! - Local part: 1–64 bytes of RFC 5322 `atext` (`[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]`)
//!   or any non-ASCII character (RFC 6531), separated by single dots; no
//!   leading or trailing dot.
//! - Domain: at least two dot-separated labels of 1–63 bytes of letters,
//!   digits (non-ASCII included) and `-`, none starting or ending with `-`.
//!
//! A valid address is returned in normalized form: the domain is
//! lowercased, the local part is kept as sent. Records are keyed on the
//! normalized form, so `a@X.COM` and `a@x.com` name the same user.

use std::fmt;

use crate::types::User;

/// Maximum email length in bytes.
pub const MAX_EMAIL_BYTES: usize = 254;
/// Maximum local-part length in bytes.
pub const MAX_LOCAL_PART_BYTES: usize = 64;
/// Maximum domain label length in bytes.
pub const MAX_LABEL_BYTES: usize = 63;
/// Maximum name length in bytes.
pub const MAX_NAME_BYTES: usize = 256;

/// Validation error with structured context.
///
/// Contains the specific constraint that was violated and the field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the violated constraint.
    pub constraint: String,
}

impl ValidationError {
    fn new(field: &str, constraint: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            constraint: constraint.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

impl std::error::Error for ValidationError {}

/// Validates both fields of a user payload and returns it with the email
/// normalized.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, name before email.
pub fn validate_user(user: &User) -> Result<User, ValidationError> {
    validate_name(&user.name)?;
    let email = validate_email(&user.email)?;
    Ok(User::new(user.name.clone(), email))
}

/// Validates a display name: non-blank and at most [`MAX_NAME_BYTES`].
///
/// # Errors
///
/// Returns [`ValidationError`] if the name is empty, only whitespace, or too long.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", "must not be empty"));
    }
    if name.len() > MAX_NAME_BYTES {
        return Err(ValidationError::new(
            "name",
            format!(
                "length {} bytes exceeds maximum {} bytes",
                name.len(),
                MAX_NAME_BYTES
            ),
        ));
    }
    Ok(())
}

/// Validates email syntax (see the module docs for the exact rules) and
/// returns the normalized address.
///
/// # Errors
///
/// Returns [`ValidationError`] naming the first rule the address breaks.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new("email", "must not be empty"));
    }
    if email.len() > MAX_EMAIL_BYTES {
        return Err(ValidationError::new(
            "email",
            format!(
                "length {} bytes exceeds maximum {} bytes",
                email.len(),
                MAX_EMAIL_BYTES
            ),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::new("email", "missing '@'"));
    };
    if domain.contains('@') {
        return Err(ValidationError::new("email", "contains more than one '@'"));
    }

    validate_local_part(local)?;
    validate_domain(domain)?;
    Ok(normalize_email(email))
}

/// Lowercase the domain of `email`, leaving the local part untouched.
///
/// Performs no validation; lookups by a path email go through this so they
/// hit the same key a validated create wrote. Input without `@` is
/// returned unchanged.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn validate_local_part(local: &str) -> Result<(), ValidationError> {
    if local.is_empty() {
        return Err(ValidationError::new("email", "local part must not be empty"));
    }
    if local.len() > MAX_LOCAL_PART_BYTES {
        return Err(ValidationError::new(
            "email",
            format!("local part exceeds {MAX_LOCAL_PART_BYTES} bytes"),
        ));
    }
    if local.split('.').any(str::is_empty) {
        return Err(ValidationError::new(
            "email",
            "local part has a leading, trailing, or repeated '.'",
        ));
    }
    if let Some(c) = local
        .chars()
        .find(|&c| c != '.' && !is_atext(c) && c.is_ascii())
    {
        return Err(ValidationError::new(
            "email",
            format!("local part contains invalid character {c:?}"),
        ));
    }
    Ok(())
}

fn validate_domain(domain: &str) -> Result<(), ValidationError> {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(ValidationError::new(
            "email",
            "domain must have at least two labels",
        ));
    }
    for label in labels {
        if label.is_empty() || label.len() > MAX_LABEL_BYTES {
            return Err(ValidationError::new(
                "email",
                format!("domain label must be 1-{MAX_LABEL_BYTES} bytes"),
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(ValidationError::new(
                "email",
                format!("domain label {label:?} starts or ends with '-'"),
            ));
        }
        if let Some(c) = label
            .chars()
            .find(|&c| !(c.is_alphanumeric() || c == '-'))
        {
            return Err(ValidationError::new(
                "email",
                format!("domain contains invalid character {c:?}"),
            ));
        }
    }
    Ok(())
}

fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for email in [
            "x@y.com",
            "first.last@example.co.uk",
            "user+tag@sub.example.org",
            "o'brien@example.ie",
            "a-b_c@my-host.io",
            "josé@example.com",
            "a@bücher.de",
            "用户@例子.广告",
        ] {
            assert!(validate_email(email).is_ok(), "{email} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in [
            "",
            "plainaddress",
            "@example.com",
            "user@",
            "user@localhost",
            "a@b@c.com",
            ".user@example.com",
            "user.@example.com",
            "us..er@example.com",
            "user name@example.com",
            "user@-example.com",
            "user@example-.com",
            "user@exa_mple.com",
            "user@example..com",
        ] {
            let err = validate_email(email).unwrap_err();
            assert_eq!(err.field, "email", "{email}");
        }
    }

    #[test]
    fn domain_is_lowercased_local_part_kept() {
        assert_eq!(validate_email("Ada@Example.COM").unwrap(), "Ada@example.com");
        assert_eq!(validate_email("a@BÜCHER.de").unwrap(), "a@bücher.de");
        assert_eq!(normalize_email("x@Y.com"), "x@y.com");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn non_ascii_controls_and_spaces_still_rejected() {
        assert!(validate_email("jo sé@example.com").is_err());
        assert!(validate_email("a@bü cher.de").is_err());
    }

    #[test]
    fn rejects_overlong_parts() {
        let local = "a".repeat(MAX_LOCAL_PART_BYTES + 1);
        assert!(validate_email(&format!("{local}@example.com")).is_err());

        let label = "b".repeat(MAX_LABEL_BYTES + 1);
        assert!(validate_email(&format!("a@{label}.com")).is_err());

        let long = format!("a@{}.com", "c.".repeat(MAX_EMAIL_BYTES / 2));
        let err = validate_email(&long).unwrap_err();
        assert!(err.constraint.contains("exceeds maximum"));
    }

    #[test]
    fn name_must_not_be_blank() {
        assert!(validate_name("Ada").is_ok());
        assert_eq!(validate_name("").unwrap_err().field, "name");
        assert_eq!(validate_name("   ").unwrap_err().field, "name");
        assert!(validate_name(&"n".repeat(MAX_NAME_BYTES + 1)).is_err());
    }

    #[test]
    fn validate_user_checks_name_first() {
        let err = validate_user(&User::new("", "not-an-email")).unwrap_err();
        assert_eq!(err.field, "name");

        let err = validate_user(&User::new("Ada", "not-an-email")).unwrap_err();
        assert_eq!(err.to_string(), "email: missing '@'");

        let user = validate_user(&User::new("Ada", "ada@EXAMPLE.com")).unwrap();
        assert_eq!(user, User::new("Ada", "ada@example.com"));
    }
}
