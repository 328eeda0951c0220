//! Email address normalisation shared by users and salespeople.

use crate::error::{DomainError, DomainResult};

/// Trim and lowercase an email after a basic shape check.
pub fn normalize_email(field: &str, raw: &str) -> DomainResult<String> {
    let email = raw.trim();
    let invalid = || DomainError::field(field, "enter a valid email address");
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(email.to_lowercase())
}
