use std::sync::Arc;
use std::time::Instant;

use crate::license_db::{LicenseTableCache, TableStatus, WaitPolicy};
use crate::models::AllergyEntry;

use super::expand::expand_tokens;
use super::license::LicenseKeys;
use super::matcher::match_allergies;
use super::normalize::{normalize_text, split_tokens};
use super::reference::ReferenceData;
use super::types::{CheckError, Evaluation};
use super::verdict::{decide_verdict, verify_license, worst_rank};

/// Evaluate one query against the allergy list and risk groups.
///
/// Rejects the query when both inputs are blank. Past that check nothing
/// fails: an unavailable or unhelpful license table only downgrades
/// verification.
pub fn evaluate(
    raw_text: &str,
    raw_license: &str,
    allergies: &[AllergyEntry],
    reference: &ReferenceData,
    table: &TableStatus,
) -> Result<Evaluation, CheckError> {
    let raw_text = raw_text.trim();
    let raw_license = raw_license.trim();
    if raw_text.is_empty() && raw_license.is_empty() {
        return Err(CheckError::EmptyInput);
    }

    let normalized_text = normalize_text(raw_text);
    let license_keys = LicenseKeys::resolve(raw_license);

    let (verification, resolved) =
        verify_license(&license_keys, !normalized_text.is_empty(), table);
    let (resolved_actives, license_info) = match resolved {
        Some(found) => (found.actives, found.info),
        None => (Vec::new(), None),
    };

    let tokens = split_tokens(&format!("{} {}", raw_text, resolved_actives.join(" ")));
    let expansion = expand_tokens(&tokens, &reference.synonyms, &reference.brands);
    let match_result =
        match_allergies(&expansion, allergies, &reference.synonyms, &reference.groups);

    let verdict = decide_verdict(&match_result, &verification);
    let worst_rank = worst_rank(&match_result);

    tracing::debug!(
        verdict = verdict.as_str(),
        direct_hits = match_result.direct_hits.len(),
        group_hits = match_result.group_hits.len(),
        verified = verification.verified,
        tokens = expansion.tokens.len(),
        "Evaluated query"
    );

    Ok(Evaluation {
        verdict,
        worst_rank,
        match_result,
        verification,
        raw_text: raw_text.to_string(),
        normalized_text,
        raw_license: raw_license.to_string(),
        license_keys,
        resolved_actives,
        license_info,
        expanded_tokens: expansion.tokens,
    })
}

/// Configuration plus the shared license table cache: the entry point a
/// front end holds for the lifetime of a session.
pub struct AllergyChecker {
    reference: ReferenceData,
    cache: Arc<LicenseTableCache>,
    policy: WaitPolicy,
}

impl AllergyChecker {
    pub fn new(reference: ReferenceData, cache: Arc<LicenseTableCache>) -> Self {
        Self {
            reference,
            cache,
            policy: WaitPolicy::Block,
        }
    }

    pub fn with_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn disclaimer(&self) -> &str {
        &self.reference.disclaimer
    }

    /// Kick off the license table load without waiting for it.
    pub fn preload(&self) {
        let _ = self.cache.preload();
    }

    /// Evaluate a query, loading the license table first when a license
    /// number was supplied.
    pub async fn check(
        &self,
        raw_text: &str,
        raw_license: &str,
        allergies: &[AllergyEntry],
    ) -> Result<Evaluation, CheckError> {
        let start = Instant::now();

        let table = if LicenseKeys::resolve(raw_license.trim()).is_empty() {
            self.cache.status()
        } else {
            self.cache.get(self.policy).await
        };

        let evaluation = evaluate(raw_text, raw_license, allergies, &self.reference, &table)?;

        tracing::info!(
            verdict = evaluation.verdict.as_str(),
            verified = evaluation.verification.verified,
            processing_ms = start.elapsed().as_millis() as u64,
            "Allergy check complete"
        );

        Ok(evaluation)
    }
}
