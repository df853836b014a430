//! Composite import identifiers.
//!
//! Resources are imported from a comma separated identifier whose fields are
//! positional, e.g. `project_id,region,server_id,update_schedule_id`. The same
//! string is used as the resource's `id` attribute.

use crate::error::{ProviderError, Result};

/// Separator between the fields of a composite identifier.
pub const SEPARATOR: char = ',';

/// Split `id` into exactly `fields.len()` non-empty parts.
///
/// `fields` names the parts in order and is used to build the error message,
/// e.g. `[project_id],[instance_id]`.
pub fn parse_id<'a>(id: &'a str, fields: &[&str]) -> Result<Vec<&'a str>> {
    let parts: Vec<&str> = id.split(SEPARATOR).collect();
    if parts.len() != fields.len() || parts.iter().any(|p| p.is_empty()) {
        return Err(ProviderError::ImportId {
            expected: expected_format(fields),
            got: id.to_string(),
        });
    }
    Ok(parts)
}

/// Build a composite identifier from its parts.
pub fn build_id(parts: &[&str]) -> String {
    parts.join(&SEPARATOR.to_string())
}

fn expected_format(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| format!("[{}]", f))
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}
