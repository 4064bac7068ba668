//! Persisted allergy-list shape: import, export, and stored-list fallback.
//!
//! The list crosses the boundary as a JSON array of objects. Each object
//! needs a non-empty string `value`; `type` defaults to `"active"` and `note`
//! to an empty string. Entries without a usable value are dropped one by one,
//! while a document that is not an array is rejected as a whole so a broken
//! list is never partially applied.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::allergy::{AllergyEntry, DEFAULT_ENTRY_TYPE};

#[derive(Error, Debug)]
pub enum AllergyListError {
    #[error("Allergy list is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Allergy list must be a JSON array")]
    NotAnArray,
}

/// Stored user data wrapper (`{ "allergies": [...] }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAllergyData {
    pub allergies: Vec<AllergyEntry>,
}

/// Convert one loosely-typed JSON item into an entry, or `None` when it has
/// no usable `value`.
pub fn entry_from_value(item: &Value) -> Option<AllergyEntry> {
    let obj = item.as_object()?;
    let value = obj.get("value")?.as_str()?.trim();
    if value.is_empty() {
        return None;
    }

    let entry_type = obj
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_ENTRY_TYPE);
    let note = obj.get("note").and_then(Value::as_str).unwrap_or("");

    Some(AllergyEntry::new(entry_type, value, note))
}

/// Keep the well-shaped entries of a JSON array, in order.
pub fn entries_from_values(items: &[Value]) -> Vec<AllergyEntry> {
    let entries: Vec<AllergyEntry> = items.iter().filter_map(entry_from_value).collect();
    let dropped = items.len() - entries.len();
    if dropped > 0 {
        tracing::warn!(dropped, kept = entries.len(), "Dropped allergy entries without a usable value");
    }
    entries
}

/// Parse an imported allergy list document.
pub fn import_allergy_list(json: &str) -> Result<Vec<AllergyEntry>, AllergyListError> {
    let parsed: Value = serde_json::from_str(json)?;
    let items = parsed.as_array().ok_or(AllergyListError::NotAnArray)?;
    Ok(entries_from_values(items))
}

/// Serialize the list for export (pretty JSON array).
pub fn export_allergy_list(entries: &[AllergyEntry]) -> Result<String, AllergyListError> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Serialize the stored user-data wrapper.
pub fn store_user_data(entries: &[AllergyEntry]) -> Result<String, AllergyListError> {
    let data = UserAllergyData {
        allergies: entries.to_vec(),
    };
    Ok(serde_json::to_string(&data)?)
}

/// Pick the user's stored list when it is present and well-formed,
/// otherwise fall back to the configured defaults.
pub fn resolve_user_list(stored: Option<&str>, defaults: &[AllergyEntry]) -> Vec<AllergyEntry> {
    let stored_items = stored
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .and_then(|v| v.get("allergies").and_then(Value::as_array).cloned());

    match stored_items {
        Some(items) => entries_from_values(&items),
        None => {
            tracing::debug!("No usable stored allergy list, using defaults");
            defaults.to_vec()
        }
    }
}
