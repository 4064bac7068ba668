use super::types::Verdict;

/// Verification reasons and verdict labels shown next to a result.
/// A clear result without verification must always say why it is not proof
/// of safety.
pub struct ReasonTemplates;

impl ReasonTemplates {
    pub fn license_not_found() -> String {
        "The license number did not resolve to any active ingredient \
         (not in the table, or written in a different format)."
            .to_string()
    }

    pub fn table_absent() -> String {
        "The license table has not been built yet, so the license number \
         could not be verified."
            .to_string()
    }

    pub fn table_failed(detail: &str) -> String {
        format!("The license table could not be loaded ({detail}); the license number was not verified.")
    }

    pub fn table_pending() -> String {
        "The license table is still loading; the license number was not verified.".to_string()
    }

    pub fn table_timed_out() -> String {
        "Timed out waiting for the license table; the license number was not verified."
            .to_string()
    }

    pub fn text_only() -> String {
        "Only text was entered (no license number). Missing verification: \
         a non-match does not mean the drug is safe. Add the license number to verify."
            .to_string()
    }

    pub fn nothing_usable() -> String {
        "No usable information was entered.".to_string()
    }

    /// Fallback when a reason is somehow empty.
    pub fn insufficient_data() -> String {
        "Not enough data to confirm this drug is safe.".to_string()
    }
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Self::HighRisk => "High risk: matches your list or a risk group",
            Self::PossiblyRelated => "Possibly related",
            Self::VerifiedClear => "Verified: no match",
            Self::UnverifiedClear => "No match (not verified)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_only_reason_mentions_missing_verification() {
        assert!(ReasonTemplates::text_only().contains("Missing verification"));
    }

    #[test]
    fn failure_reason_carries_detail() {
        assert!(ReasonTemplates::table_failed("HTTP 500").contains("HTTP 500"));
    }

    #[test]
    fn labels_are_distinct() {
        let labels = [
            Verdict::HighRisk.label(),
            Verdict::PossiblyRelated.label(),
            Verdict::VerifiedClear.label(),
            Verdict::UnverifiedClear.label(),
        ];
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
