use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::allergy_list::entries_from_values;
use crate::models::enums::Severity;
use crate::models::{AllergyEntry, RiskGroup};

use super::types::CheckError;

/// Lowercase token → canonical token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymMap(HashMap<String, String>);

impl SynonymMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: &str, canonical: &str) {
        let key = token.trim().to_lowercase();
        let value = canonical.trim().to_lowercase();
        if !key.is_empty() && !value.is_empty() {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.0.get(token).map(String::as_str)
    }

    /// Canonical form of a token, or the token itself when unmapped.
    pub fn apply(&self, token: &str) -> String {
        self.get(token).unwrap_or(token).to_string()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lowercase brand token → ordered active-ingredient tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandMap(HashMap<String, Vec<String>>);

impl BrandMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, brand: &str, actives: &[&str]) {
        let key = brand.trim().to_lowercase();
        let values: Vec<String> = actives
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        if !key.is_empty() && !values.is_empty() {
            self.0.insert(key, values);
        }
    }

    pub fn get(&self, brand: &str) -> Option<&[String]> {
        self.0.get(brand).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validated configuration bundle.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub disclaimer: String,
    pub default_allergies: Vec<AllergyEntry>,
    pub synonyms: SynonymMap,
    pub brands: BrandMap,
    pub groups: Vec<RiskGroup>,
}

/// Bundle as it appears on disk, before validation.
#[derive(Debug, Deserialize)]
struct RawBundle {
    #[serde(default)]
    disclaimer: Value,
    #[serde(default)]
    allergies: Vec<Value>,
    #[serde(default)]
    synonyms: Map<String, Value>,
    #[serde(default)]
    brand_to_actives: Map<String, Value>,
    #[serde(default)]
    groups: Vec<Value>,
}

impl ReferenceData {
    /// Load the bundle from a JSON file. A missing or unreadable bundle is
    /// fatal for the session.
    pub fn load(path: &Path) -> Result<Self, CheckError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| CheckError::ConfigLoad(path.display().to_string(), e.to_string()))?;
        Self::from_json(&json)
    }

    /// Parse and validate. Malformed individual entries are dropped with a
    /// warning; a document that is not a bundle object is an error.
    pub fn from_json(json: &str) -> Result<Self, CheckError> {
        let raw: RawBundle = serde_json::from_str(json)
            .map_err(|e| CheckError::ConfigParse("data.json".into(), e.to_string()))?;

        let reference = Self {
            disclaimer: raw.disclaimer.as_str().unwrap_or_default().to_string(),
            default_allergies: entries_from_values(&raw.allergies),
            synonyms: parse_synonyms(&raw.synonyms),
            brands: parse_brands(&raw.brand_to_actives),
            groups: raw.groups.iter().filter_map(parse_group).collect(),
        };

        tracing::info!(
            allergies = reference.default_allergies.len(),
            synonyms = reference.synonyms.len(),
            brands = reference.brands.len(),
            groups = reference.groups.len(),
            "Configuration bundle loaded"
        );

        Ok(reference)
    }

    /// Create reference data for tests (no file I/O).
    pub fn load_test() -> Self {
        let mut synonyms = SynonymMap::new();
        synonyms.insert("paracetamol", "acetaminophen");
        synonyms.insert("apap", "acetaminophen");
        synonyms.insert("asa", "aspirin");
        synonyms.insert("acetylsalicylic", "aspirin");

        let mut brands = BrandMap::new();
        brands.insert("泰諾", &["acetaminophen"]);
        brands.insert("普拿疼", &["acetaminophen"]);
        brands.insert("tylenol", &["paracetamol"]);
        brands.insert("advil", &["ibuprofen"]);
        brands.insert("augmentin", &["amoxicillin", "clavulanate"]);
        brands.insert("bactrim", &["sulfamethoxazole", "trimethoprim"]);

        Self {
            disclaimer: "For reference only. Always confirm with a pharmacist.".into(),
            default_allergies: vec![AllergyEntry::active("penicillin")],
            synonyms,
            brands,
            groups: vec![
                RiskGroup::new(
                    "nsaids",
                    "NSAIDs",
                    Severity::High,
                    &["aspirin", "ibuprofen", "naproxen", "diclofenac"],
                ),
                RiskGroup::new(
                    "penicillins",
                    "Penicillins",
                    Severity::High,
                    &["penicillin", "amoxicillin", "ampicillin"],
                ),
                RiskGroup::new(
                    "sulfonamides",
                    "Sulfonamide antibiotics",
                    Severity::Medium,
                    &["sulfamethoxazole", "sulfadiazine"],
                ),
                RiskGroup::new("opioids", "Opioids", Severity::Low, &["codeine", "tramadol"]),
            ],
        }
    }
}

fn parse_synonyms(raw: &Map<String, Value>) -> SynonymMap {
    let mut synonyms = SynonymMap::new();
    for (token, canonical) in raw {
        match canonical.as_str() {
            Some(canonical) => synonyms.insert(token, canonical),
            None => tracing::warn!(token = %token, "Dropping synonym with non-string target"),
        }
    }
    synonyms
}

fn parse_brands(raw: &Map<String, Value>) -> BrandMap {
    let mut brands = BrandMap::new();
    for (brand, actives) in raw {
        let Some(items) = actives.as_array() else {
            tracing::warn!(brand = %brand, "Dropping brand whose actives are not a list");
            continue;
        };
        let actives: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
        brands.insert(brand, &actives);
    }
    brands
}

fn parse_group(raw: &Value) -> Option<RiskGroup> {
    let obj = raw.as_object()?;
    let Some(id) = obj
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        tracing::warn!("Dropping risk group without an id");
        return None;
    };

    let name = obj.get("name").and_then(Value::as_str).unwrap_or(id);
    let severity = Severity::parse_lenient(obj.get("severity").and_then(Value::as_str));
    let members: Vec<&str> = obj
        .get("members")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    Some(RiskGroup::new(id, name, severity, &members))
}
