//! Input validation.
//!
//! These checks run before any network call; a failure here has no side
//! effects anywhere.

use std::collections::BTreeMap;

use crate::error::CoreError;

/// Reject blank required fields.
pub fn required(field: &'static str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::MissingField(field));
    }
    Ok(())
}

/// A content identifier must be non-empty and free of whitespace.
pub fn cid(value: &str) -> Result<(), CoreError> {
    if value.is_empty() || value.chars().any(|c| c.is_whitespace()) {
        return Err(CoreError::InvalidCid(value.to_string()));
    }
    Ok(())
}

/// Patient-update field maps must be non-empty, with non-blank keys and
/// values, and must not shadow the reserved `updatedAt` stamp.
pub fn patient_update_fields(fields: &BTreeMap<String, String>) -> Result<(), CoreError> {
    if fields.is_empty() {
        return Err(CoreError::EmptyUpdate);
    }
    for (key, value) in fields {
        if key.trim().is_empty() || key == "updatedAt" {
            return Err(CoreError::ReservedUpdateField(key.clone()));
        }
        if value.trim().is_empty() {
            return Err(CoreError::ReservedUpdateField(key.clone()));
        }
    }
    Ok(())
}
