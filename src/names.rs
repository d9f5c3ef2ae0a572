//! Identifier rules for databases and collections, checked before a handle
//! is bound so a bad name surfaces as `InvalidName` instead of a server error.

use crate::errors::{DbError, NameKind};

const DB_FORBIDDEN: &[char] = &['/', '\\', '.', ' ', '"', '$', '*', '<', '>', ':', '|', '?', '\0'];
const MAX_DB_NAME_BYTES: usize = 63;
const MAX_COLLECTION_NAME_BYTES: usize = 255;

fn invalid(kind: NameKind, name: &str, reason: impl Into<String>) -> DbError {
    DbError::InvalidName { kind, name: name.to_string(), reason: reason.into() }
}

/// # Errors
/// Returns `InvalidName` if `name` is empty, too long, or contains a reserved character.
pub fn validate_database_name(name: &str) -> Result<(), DbError> {
    if name.is_empty() {
        return Err(invalid(NameKind::Database, name, "must not be empty"));
    }
    if name.len() > MAX_DB_NAME_BYTES {
        return Err(invalid(
            NameKind::Database,
            name,
            format!("longer than {MAX_DB_NAME_BYTES} bytes"),
        ));
    }
    if let Some(c) = name.chars().find(|c| DB_FORBIDDEN.contains(c)) {
        return Err(invalid(NameKind::Database, name, format!("contains {c:?}")));
    }
    Ok(())
}

/// # Errors
/// Returns `InvalidName` if `name` is empty, too long, contains `$` or NUL,
/// or lives in the reserved `system.` namespace.
pub fn validate_collection_name(name: &str) -> Result<(), DbError> {
    if name.is_empty() {
        return Err(invalid(NameKind::Collection, name, "must not be empty"));
    }
    if name.len() > MAX_COLLECTION_NAME_BYTES {
        return Err(invalid(
            NameKind::Collection,
            name,
            format!("longer than {MAX_COLLECTION_NAME_BYTES} bytes"),
        ));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '$' | '\0')) {
        return Err(invalid(NameKind::Collection, name, format!("contains {c:?}")));
    }
    if name.starts_with("system.") {
        return Err(invalid(NameKind::Collection, name, "the system. prefix is reserved"));
    }
    Ok(())
}
