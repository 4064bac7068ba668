use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::LicenseDbError;

/// One stored license entry. Two historical shapes are accepted: a bare
/// array of actives, or an object carrying them under `actives`. Non-string
/// elements inside an actives array are dropped; the remaining ingredients
/// still count. Anything else is kept as `Malformed` so the table still loads
/// and the lookup degrades to "not found" for that key only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LicenseRecord {
    Bare(Vec<String>),
    Detailed(DetailedRecord),
    Malformed(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedRecord {
    pub actives: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_zh: Option<String>,
}

impl<'de> Deserialize<'de> for LicenseRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_value(Value::deserialize(deserializer)?))
    }
}

/// String elements of an actives array, in order.
fn string_items(items: &[Value]) -> Vec<String> {
    let actives: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    if actives.len() < items.len() {
        tracing::debug!(
            dropped = items.len() - actives.len(),
            "Ignoring non-string actives in license record"
        );
    }
    actives
}

/// Metadata fields never make a record unreadable; non-strings become `None`.
fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

impl LicenseRecord {
    fn from_value(value: Value) -> Self {
        match &value {
            Value::Array(items) => Self::Bare(string_items(items)),
            Value::Object(obj) => match obj.get("actives").and_then(Value::as_array) {
                Some(items) => Self::Detailed(DetailedRecord {
                    actives: string_items(items),
                    source: string_field(obj, "source"),
                    updated: string_field(obj, "updated"),
                    name_zh: string_field(obj, "name_zh"),
                }),
                None => Self::Malformed(value),
            },
            _ => Self::Malformed(value),
        }
    }
}

/// Provenance attached to detailed records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordInfo {
    pub source: Option<String>,
    pub updated: Option<NaiveDate>,
    pub name_zh: Option<String>,
}

impl LicenseRecord {
    /// The active-ingredient sequence, if this record has a readable shape.
    pub fn actives(&self) -> Option<&[String]> {
        match self {
            Self::Bare(actives) => Some(actives),
            Self::Detailed(record) => Some(&record.actives),
            Self::Malformed(_) => None,
        }
    }

    pub fn info(&self) -> Option<RecordInfo> {
        match self {
            Self::Detailed(record) => Some(RecordInfo {
                source: record.source.clone(),
                updated: record
                    .updated
                    .as_deref()
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
                name_zh: record.name_zh.clone(),
            }),
            _ => None,
        }
    }
}

/// License key → record table, loaded once per process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicenseTable {
    records: HashMap<String, LicenseRecord>,
}

impl LicenseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON document. The top level must be an object; individual
    /// records of unexpected shape are kept as `Malformed`.
    pub fn from_json(json: &str) -> Result<Self, LicenseDbError> {
        let records: HashMap<String, LicenseRecord> =
            serde_json::from_str(json).map_err(|e| LicenseDbError::Parse(e.to_string()))?;

        let malformed = records
            .values()
            .filter(|r| matches!(r, LicenseRecord::Malformed(_)))
            .count();
        if malformed > 0 {
            tracing::warn!(malformed, "License table contains records of unknown shape");
        }

        Ok(Self { records })
    }

    pub fn to_json(&self) -> Result<String, LicenseDbError> {
        serde_json::to_string(&self.records).map_err(|e| LicenseDbError::Parse(e.to_string()))
    }

    pub fn insert(&mut self, key: impl Into<String>, record: LicenseRecord) {
        self.records.insert(key.into(), record);
    }

    /// Raw record for an exact key. Empty keys never match.
    pub fn get(&self, key: &str) -> Option<&LicenseRecord> {
        if key.is_empty() {
            return None;
        }
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
