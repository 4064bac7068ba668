use std::collections::HashSet;

use super::reference::{BrandMap, SynonymMap};

/// Token stream after synonym substitution and brand expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Ordered tokens: substituted input first, then appended brand actives.
    pub tokens: Vec<String>,
    pub set: HashSet<String>,
}

impl Expansion {
    pub fn contains(&self, token: &str) -> bool {
        self.set.contains(token)
    }

    /// Tokens joined by single spaces, for substring matching.
    pub fn joined(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Substitute synonyms, then append the actives of every brand token.
///
/// Brand tokens stay in the stream so an allergy recorded under the brand
/// name still matches. Appended actives get synonym substitution but are not
/// looked up as brands again; expansion is a single pass.
pub fn expand_tokens<S: AsRef<str>>(
    tokens: &[S],
    synonyms: &SynonymMap,
    brands: &BrandMap,
) -> Expansion {
    let mut expanded: Vec<String> = tokens
        .iter()
        .map(|t| synonyms.apply(t.as_ref()))
        .collect();

    let appended: Vec<String> = expanded
        .iter()
        .filter_map(|t| brands.get(t))
        .flatten()
        .map(|active| synonyms.apply(active))
        .collect();
    expanded.extend(appended);

    let set = expanded.iter().cloned().collect();
    Expansion {
        tokens: expanded,
        set,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::reference::ReferenceData;
    use proptest::prelude::*;

    fn expand(tokens: &[&str]) -> Expansion {
        let reference = ReferenceData::load_test();
        expand_tokens(tokens, &reference.synonyms, &reference.brands)
    }

    #[test]
    fn synonyms_are_substituted() {
        let expansion = expand(&["paracetamol", "codeine"]);
        assert_eq!(expansion.tokens, vec!["acetaminophen", "codeine"]);
    }

    #[test]
    fn brands_are_kept_and_expanded() {
        let expansion = expand(&["augmentin"]);
        assert_eq!(
            expansion.tokens,
            vec!["augmentin", "amoxicillin", "clavulanate"]
        );
        assert!(expansion.contains("augmentin"));
    }

    #[test]
    fn appended_actives_get_synonyms() {
        let expansion = expand(&["tylenol"]);
        assert_eq!(expansion.tokens, vec!["tylenol", "acetaminophen"]);
    }

    #[test]
    fn cjk_brand_expands() {
        let expansion = expand(&["泰諾"]);
        assert!(expansion.contains("acetaminophen"));
        assert_eq!(expansion.joined(), "泰諾 acetaminophen");
    }

    #[test]
    fn expansion_is_single_pass() {
        let mut synonyms = SynonymMap::new();
        synonyms.insert("x", "y");
        let mut brands = BrandMap::new();
        brands.insert("combo", &["advil"]);
        brands.insert("advil", &["ibuprofen"]);

        let expansion = expand_tokens(&["combo"], &synonyms, &brands);
        assert_eq!(expansion.tokens, vec!["combo", "advil"]);
        assert!(!expansion.contains("ibuprofen"));
    }

    #[test]
    fn empty_input() {
        let expansion = expand(&[]);
        assert!(expansion.tokens.is_empty());
        assert_eq!(expansion.joined(), "");
    }

    proptest! {
        #[test]
        fn expansion_is_monotonic(
            tokens in proptest::collection::vec(
                prop_oneof![
                    Just("augmentin"), Just("tylenol"), Just("paracetamol"),
                    Just("asa"), Just("泰諾"), Just("codeine"), Just("xyz"),
                ],
                0..8,
            )
        ) {
            let reference = ReferenceData::load_test();
            let expansion = expand_tokens(&tokens, &reference.synonyms, &reference.brands);
            for token in &tokens {
                let substituted = reference.synonyms.apply(token);
                prop_assert!(expansion.contains(&substituted));
            }
            prop_assert!(expansion.tokens.len() >= tokens.len());
        }
    }
}
