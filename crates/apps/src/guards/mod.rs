//! Guards: validation deciding whether a command is legal right now.
//!
//! A guard reads the current snapshot (and, for some commands, external services)
//! and either returns `Ok` or the first violation it finds. Guards never mutate
//! state. When a guard fails the handler stops; no later guard runs and no event
//! is emitted.

pub mod app;
pub mod clients;
pub mod contributors;
pub mod languages;
pub mod patterns;
pub mod plans;

use appfold_core::{DomainError, DomainResult};

/// Lowercase ASCII letters, digits and single dashes, not starting or ending with a dash.
pub(crate) fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--")
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub(crate) fn require(value: &str, property: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{property} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert!(is_slug("my-app"));
        assert!(is_slug("app2"));
        for bad in ["", "-app", "app-", "my--app", "My-App", "my app", "my_app"] {
            assert!(!is_slug(bad), "{bad} should not be a slug");
        }
    }

    #[test]
    fn require_rejects_blank() {
        assert!(require("  ", "name").is_err());
        assert!(require("x", "name").is_ok());
    }
}
