//! Table identifier validation.
//!
//! Table names come from configuration and are spliced into SQL text, so
//! they are restricted to plain SQL identifiers.

use crate::error::{DbError, Result};

const MAX_IDENTIFIER_LEN: usize = 64;

/// Validate that `name` is a bare SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let first = chars
        .next()
        .ok_or_else(|| DbError::InvalidIdentifier("identifier is empty".to_string()))?;

    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(DbError::InvalidIdentifier(format!(
            "'{}' must start with a letter or underscore",
            name
        )));
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(DbError::InvalidIdentifier(format!(
            "'{}' may only contain letters, digits and underscores",
            name
        )));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(DbError::InvalidIdentifier(format!(
            "'{}' is longer than {} characters",
            name, MAX_IDENTIFIER_LEN
        )));
    }
    if name.to_ascii_lowercase().starts_with("sqlite_") {
        return Err(DbError::InvalidIdentifier(format!(
            "'{}' uses the reserved sqlite_ prefix",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_identifiers() {
        assert!(validate_identifier("file_credentials").is_ok());
        assert!(validate_identifier("_results2").is_ok());
        assert!(validate_identifier("ParsedCasData").is_ok());
    }

    #[test]
    fn test_rejects_injection_and_garbage() {
        for bad in [
            "",
            "1table",
            "parsed cas",
            "t; DROP TABLE x",
            "t\"",
            "sqlite_master",
            "naïve",
        ] {
            assert!(
                matches!(validate_identifier(bad), Err(DbError::InvalidIdentifier(_))),
                "expected rejection for {:?}",
                bad
            );
        }
        assert!(validate_identifier(&"a".repeat(65)).is_err());
    }
}
