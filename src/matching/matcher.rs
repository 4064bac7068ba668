use std::collections::HashSet;

use crate::models::{AllergyEntry, RiskGroup};

use super::expand::Expansion;
use super::normalize::{contains_cjk, normalize_text};
use super::reference::SynonymMap;
use super::types::{DirectHit, GroupHit, MatchKind, MatchResult};

/// Minimum length (in characters) of a CJK entry for substring matching.
const MIN_CJK_SUBSTRING_CHARS: usize = 2;

/// Match the expanded tokens against personal entries and risk groups.
/// No ranking happens here.
pub fn match_allergies(
    expansion: &Expansion,
    allergies: &[AllergyEntry],
    synonyms: &SynonymMap,
    groups: &[RiskGroup],
) -> MatchResult {
    MatchResult {
        direct_hits: match_direct(expansion, allergies, synonyms),
        group_hits: match_groups(expansion, groups),
    }
}

/// Exact-token hits followed by CJK substring hits, de-duplicated on
/// (canonical form, value).
fn match_direct(
    expansion: &Expansion,
    allergies: &[AllergyEntry],
    synonyms: &SynonymMap,
) -> Vec<DirectHit> {
    let mut hits = Vec::new();

    for entry in allergies {
        let canonical = synonyms.apply(&normalize_text(&entry.value));
        if !canonical.is_empty() && expansion.contains(&canonical) {
            hits.push(direct_hit(entry, canonical, MatchKind::Token));
        }
    }

    let joined = expansion.joined();
    for entry in allergies {
        let value = entry.value.trim();
        if value.chars().count() < MIN_CJK_SUBSTRING_CHARS || !contains_cjk(value) {
            continue;
        }
        let needle = normalize_text(value);
        if !needle.is_empty() && joined.contains(&needle) {
            hits.push(direct_hit(entry, needle, MatchKind::Substring));
        }
    }

    let mut seen = HashSet::new();
    hits.retain(|h| seen.insert((h.canonical.clone(), h.value.clone())));
    hits
}

fn direct_hit(entry: &AllergyEntry, canonical: String, kind: MatchKind) -> DirectHit {
    DirectHit {
        value: entry.value.trim().to_string(),
        note: entry.note.clone(),
        canonical,
        kind,
    }
}

fn match_groups(expansion: &Expansion, groups: &[RiskGroup]) -> Vec<GroupHit> {
    groups
        .iter()
        .filter_map(|group| {
            let mut hit_members: Vec<String> = Vec::new();
            for member in &group.members {
                if expansion.contains(member) && !hit_members.contains(member) {
                    hit_members.push(member.clone());
                }
            }
            if hit_members.is_empty() {
                return None;
            }
            Some(GroupHit {
                id: group.id.clone(),
                name: group.name.clone(),
                severity: group.severity,
                hit_members,
            })
        })
        .collect()
}
