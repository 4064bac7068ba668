use serde::{Deserialize, Serialize};

/// Default entry type when none is recorded.
pub const DEFAULT_ENTRY_TYPE: &str = "active";

/// One line of the user's allergy list, as entered (any script).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergyEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub value: String,
    #[serde(default)]
    pub note: String,
}

impl AllergyEntry {
    pub fn new(entry_type: &str, value: &str, note: &str) -> Self {
        Self {
            entry_type: entry_type.to_string(),
            value: value.to_string(),
            note: note.to_string(),
        }
    }

    /// Active-ingredient entry with no note.
    pub fn active(value: &str) -> Self {
        Self::new(DEFAULT_ENTRY_TYPE, value, "")
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = note.to_string();
        self
    }
}
