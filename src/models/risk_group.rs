use serde::{Deserialize, Serialize};

use super::enums::Severity;

/// A named set of cross-reactive active ingredients (e.g. NSAIDs).
/// Members are lowercase active-ingredient tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskGroup {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub members: Vec<String>,
}

impl RiskGroup {
    /// Build a group, lowercasing and de-duplicating members in order.
    pub fn new(id: &str, name: &str, severity: Severity, members: &[&str]) -> Self {
        let mut cleaned: Vec<String> = Vec::with_capacity(members.len());
        for m in members {
            let lower = m.trim().to_lowercase();
            if !lower.is_empty() && !cleaned.contains(&lower) {
                cleaned.push(lower);
            }
        }
        Self {
            id: id.to_string(),
            name: name.to_string(),
            severity,
            members: cleaned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_are_lowercased_and_deduplicated() {
        let group = RiskGroup::new(
            "nsaids",
            "NSAIDs",
            Severity::High,
            &["Ibuprofen", "aspirin", "IBUPROFEN", " "],
        );
        assert_eq!(group.members, vec!["ibuprofen", "aspirin"]);
    }
}
