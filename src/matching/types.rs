use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::license_db::RecordInfo;
use crate::models::allergy_list::AllergyListError;
use crate::models::enums::{str_enum, Severity};

use super::license::LicenseKeys;

// ---------------------------------------------------------------------------
// Match results
// ---------------------------------------------------------------------------

/// How a personal allergy entry was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Canonical entry value is one of the expanded tokens.
    Token,
    /// CJK entry value found inside the joined token stream.
    Substring,
}

/// A hit against the user's own allergy list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectHit {
    pub value: String,
    pub note: String,
    pub canonical: String,
    pub kind: MatchKind,
}

/// A hit against a cross-reactive risk group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupHit {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub hit_members: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub direct_hits: Vec<DirectHit>,
    pub group_hits: Vec<GroupHit>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.direct_hits.is_empty() && self.group_hits.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Verification & verdict
// ---------------------------------------------------------------------------

/// Whether the ingredients were proven through a license lookup.
/// `verified` is true only for a non-empty lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationStatus {
    pub verified: bool,
    pub reason: String,
}

impl VerificationStatus {
    pub fn verified() -> Self {
        Self {
            verified: true,
            reason: String::new(),
        }
    }

    pub fn unverified(reason: String) -> Self {
        Self {
            verified: false,
            reason,
        }
    }
}

str_enum!(Verdict {
    HighRisk => "high_risk",
    PossiblyRelated => "possibly_related",
    VerifiedClear => "verified_clear",
    UnverifiedClear => "unverified_clear",
});

str_enum!(Tone {
    Bad => "bad",
    Warn => "warn",
    Good => "good",
});

impl Verdict {
    /// Display tone; only a verified clear result is ever "good".
    pub fn tone(&self) -> Tone {
        match self {
            Self::HighRisk => Tone::Bad,
            Self::PossiblyRelated | Self::UnverifiedClear => Tone::Warn,
            Self::VerifiedClear => Tone::Good,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Everything the presentation layer needs for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    /// Highest severity rank among hits (3 for any direct hit, 1 when clear).
    pub worst_rank: u8,
    pub match_result: MatchResult,
    pub verification: VerificationStatus,
    pub raw_text: String,
    pub normalized_text: String,
    pub raw_license: String,
    pub license_keys: LicenseKeys,
    pub resolved_actives: Vec<String>,
    pub license_info: Option<RecordInfo>,
    pub expanded_tokens: Vec<String>,
}

impl Evaluation {
    /// The "not verified" warning accompanies every result that is neither
    /// verified nor high risk.
    pub fn show_unverified_warning(&self) -> bool {
        !self.verification.verified && self.worst_rank < Severity::High.rank()
    }

    /// Group hits ordered by descending severity (stable within a rank).
    pub fn ranked_group_hits(&self) -> Vec<&GroupHit> {
        let mut hits: Vec<&GroupHit> = self.match_result.group_hits.iter().collect();
        hits.sort_by(|a, b| b.severity.rank().cmp(&a.severity.rank()));
        hits
    }
}

// ---------------------------------------------------------------------------
// CheckError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Enter a drug name/ingredient or a license number")]
    EmptyInput,

    #[error("Configuration load failed ({0}): {1}")]
    ConfigLoad(String, String),

    #[error("Configuration parse failed ({0}): {1}")]
    ConfigParse(String, String),

    #[error("Allergy list error: {0}")]
    AllergyList(#[from] AllergyListError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_verified_clear_is_good() {
        assert_eq!(Verdict::VerifiedClear.tone(), Tone::Good);
        assert_eq!(Verdict::UnverifiedClear.tone(), Tone::Warn);
        assert_eq!(Verdict::PossiblyRelated.tone(), Tone::Warn);
        assert_eq!(Verdict::HighRisk.tone(), Tone::Bad);
    }

    #[test]
    fn verdict_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Verdict::UnverifiedClear).unwrap(),
            "\"unverified_clear\""
        );
    }

    #[test]
    fn empty_match_result() {
        assert!(MatchResult::default().is_empty());
    }
}
