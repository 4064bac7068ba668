use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::license_db::{LicenseTable, RecordInfo};

/// First run of 5 or 6 ASCII digits (the license number core).
static RE_LICENSE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{5,6}").unwrap());

/// The two lookup keys derived from a raw license string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LicenseKeys {
    /// Input with all whitespace removed, case untouched.
    pub full: String,
    /// Bare 5–6 digit core, or empty.
    pub digits: String,
}

impl LicenseKeys {
    pub fn resolve(raw: &str) -> Self {
        Self {
            full: license_full_key(raw),
            digits: license_digits_key(raw),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty() && self.digits.is_empty()
    }
}

/// Remove every whitespace character, including ideographic spaces.
pub fn license_full_key(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn license_digits_key(raw: &str) -> String {
    RE_LICENSE_DIGITS
        .find(raw)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// A successful license lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLicense {
    pub matched_key: String,
    pub actives: Vec<String>,
    pub info: Option<RecordInfo>,
}

/// Look up active ingredients, full key first, then the digits key.
///
/// The first key present in the table decides the outcome: a record of
/// unreadable shape is "not found" and does not fall through to the other
/// key.
pub fn lookup_license(table: &LicenseTable, keys: &LicenseKeys) -> Option<ResolvedLicense> {
    let (matched_key, record) = [&keys.full, &keys.digits]
        .into_iter()
        .find_map(|key| table.get(key).map(|record| (key.clone(), record)))?;

    let Some(actives) = record.actives() else {
        tracing::warn!(key = %matched_key, "License record has an unreadable shape");
        return None;
    };

    Some(ResolvedLicense {
        matched_key,
        actives: actives.to_vec(),
        info: record.info(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license_db::LicenseRecord;
    use proptest::prelude::*;

    fn table() -> LicenseTable {
        LicenseTable::from_json(
            r#"{
                "衛署藥製字第012345號": ["aspirin"],
                "054321": {"actives": ["acetaminophen", "caffeine"], "name_zh": "普拿疼"},
                "衛署藥輸字第099999號": {"actives": "broken"},
                "099999": ["ibuprofen"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn full_key_strips_all_whitespace() {
        assert_eq!(
            license_full_key(" 衛 署 藥 製 字\u{3000}第012345號 "),
            "衛署藥製字第012345號"
        );
        assert_eq!(license_full_key(""), "");
    }

    #[test]
    fn full_key_keeps_case() {
        assert_eq!(license_full_key("Lic 0123"), "Lic0123");
    }

    #[test]
    fn digits_key_takes_first_run() {
        assert_eq!(license_digits_key("衛署藥製字第012345號"), "012345");
        assert_eq!(license_digits_key("No. 1234567"), "123456");
        assert_eq!(license_digits_key("12 34567"), "34567");
        assert_eq!(license_digits_key("1234"), "");
        assert_eq!(license_digits_key(""), "");
    }

    #[test]
    fn lookup_prefers_full_key() {
        let keys = LicenseKeys::resolve("衛署藥製字第012345號");
        let found = lookup_license(&table(), &keys).unwrap();
        assert_eq!(found.matched_key, "衛署藥製字第012345號");
        assert_eq!(found.actives, vec!["aspirin"]);
        assert!(found.info.is_none());
    }

    #[test]
    fn lookup_falls_back_to_digits() {
        let keys = LicenseKeys::resolve("衛署藥輸字第054321號");
        let found = lookup_license(&table(), &keys).unwrap();
        assert_eq!(found.matched_key, "054321");
        assert_eq!(found.actives, vec!["acetaminophen", "caffeine"]);
        assert_eq!(found.info.unwrap().name_zh.as_deref(), Some("普拿疼"));
    }

    #[test]
    fn malformed_record_is_not_found() {
        let keys = LicenseKeys::resolve("衛署藥輸字第099999號");
        assert!(lookup_license(&table(), &keys).is_none());
    }

    #[test]
    fn unknown_license_is_not_found() {
        let keys = LicenseKeys::resolve("衛署藥製字第000001號");
        assert!(lookup_license(&table(), &keys).is_none());
        assert!(lookup_license(&LicenseTable::new(), &keys).is_none());
    }

    #[test]
    fn empty_actives_are_returned_as_empty() {
        let mut table = LicenseTable::new();
        table.insert("123456", LicenseRecord::Bare(vec![]));
        let found = lookup_license(&table, &LicenseKeys::resolve("123456")).unwrap();
        assert!(found.actives.is_empty());
    }

    proptest! {
        #[test]
        fn digits_key_is_short_substring_of_full_key(s in "[0-9a-z 第號衛署]{0,30}") {
            let keys = LicenseKeys::resolve(&s);
            if !keys.digits.is_empty() {
                prop_assert!(keys.digits.len() == 5 || keys.digits.len() == 6);
                prop_assert!(keys.full.contains(&keys.digits));
            }
        }
    }
}
