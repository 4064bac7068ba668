use crate::license_db::TableStatus;
use crate::models::enums::Severity;

use super::license::{lookup_license, LicenseKeys, ResolvedLicense};
use super::messages::ReasonTemplates;
use super::types::{MatchResult, Verdict, VerificationStatus};

/// Highest rank among hits. Any direct hit counts as high; no hits rank low.
pub fn worst_rank(result: &MatchResult) -> u8 {
    let direct = if result.direct_hits.is_empty() {
        Severity::Low.rank()
    } else {
        Severity::High.rank()
    };
    result
        .group_hits
        .iter()
        .map(|g| g.severity.rank())
        .fold(direct, u8::max)
}

/// Tri-state fail-safe verdict, in strict priority order:
/// high-ranked hit, medium-ranked hit, verified clear, unverified clear.
pub fn decide_verdict(result: &MatchResult, verification: &VerificationStatus) -> Verdict {
    match worst_rank(result) {
        rank if rank >= Severity::High.rank() => Verdict::HighRisk,
        rank if rank == Severity::Medium.rank() => Verdict::PossiblyRelated,
        _ if verification.verified => Verdict::VerifiedClear,
        _ => Verdict::UnverifiedClear,
    }
}

/// Verification status for a query, plus the resolved license on success.
///
/// Verified only when a license was supplied, the table is loaded and the
/// lookup yields at least one active ingredient. Every other path carries a
/// reason naming the cause.
pub fn verify_license(
    keys: &LicenseKeys,
    has_text: bool,
    table: &TableStatus,
) -> (VerificationStatus, Option<ResolvedLicense>) {
    if keys.is_empty() {
        let reason = if has_text {
            ReasonTemplates::text_only()
        } else {
            ReasonTemplates::nothing_usable()
        };
        return (VerificationStatus::unverified(reason), None);
    }

    let reason = match table {
        TableStatus::Loaded(table) => match lookup_license(table, keys) {
            Some(found) if !found.actives.is_empty() => {
                return (VerificationStatus::verified(), Some(found));
            }
            _ => ReasonTemplates::license_not_found(),
        },
        TableStatus::Absent => ReasonTemplates::table_absent(),
        TableStatus::Failed(detail) => ReasonTemplates::table_failed(detail),
        TableStatus::Pending => ReasonTemplates::table_pending(),
        TableStatus::TimedOut => ReasonTemplates::table_timed_out(),
    };
    (VerificationStatus::unverified(reason), None)
}
