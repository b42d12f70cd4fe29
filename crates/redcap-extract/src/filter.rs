//! Field selection for the export
//!
//! The data dictionary decides which columns leave REDCap. Identifier fields
//! and a fixed set of known-sensitive fields are always dropped; free-text
//! `notes` fields are dropped on request. Columns the dictionary does not
//! describe (survey identifiers, instrument timestamps, completion flags)
//! pass through untouched.

use crate::api::types::{MetadataEntry, Record};
use std::collections::HashMap;
use tracing::debug;

/// Fields never exported, whatever their metadata says
pub const BLACKLISTED_FIELDS: [&str; 3] = ["landline", "giffgaff_password", "fitbit_password"];

/// REDCap field type for free-text areas
pub const NOTES_FIELD_TYPE: &str = "notes";

/// Whether a dictionary field may appear in the export
pub fn should_include(entry: &MetadataEntry, exclude_notes: bool) -> bool {
    if !entry.identifier.is_empty() {
        return false;
    }
    if BLACKLISTED_FIELDS.contains(&entry.field_name.as_str()) {
        return false;
    }
    !(exclude_notes && entry.field_type == NOTES_FIELD_TYPE)
}

/// Columns to export, in the key order of `first`
///
/// Only the first record is consulted, so a field missing from it is not
/// exported even when later records carry it.
pub fn select_fields(first: &Record, metadata: &[MetadataEntry], exclude_notes: bool) -> Vec<String> {
    // Later duplicates win, as REDCap should never send any
    let by_name: HashMap<&str, &MetadataEntry> = metadata
        .iter()
        .map(|entry| (entry.field_name.as_str(), entry))
        .collect();

    first
        .field_names()
        .filter(|name| match by_name.get(name) {
            Some(entry) => {
                let keep = should_include(entry, exclude_notes);
                debug!(field = name, keep, "Filtered dictionary field");
                keep
            },
            None => {
                debug!(field = name, "Passing through field without metadata");
                true
            },
        })
        .map(str::to_owned)
        .collect()
}
