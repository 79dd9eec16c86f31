//! Two-phase inference over the catalogue index.
//!
//! Phase 1 excludes every product contraindicated by a declared condition;
//! phase 2 matches symptoms to products, filtered by the exclusions. The
//! two rules have no mutual recursion (exclusion never depends on a prior
//! recommendation), so this is plain set algebra — no working memory, no
//! agenda, no state carried across calls.

use std::collections::BTreeSet;

use crate::catalogue::CatalogueIndex;

/// Raw inference output. Everything is token/product-level; ranking and
/// presentation happen in the ranker.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Inference {
    /// (product, covered symptom token) pairs, exclusions already applied.
    pub matches: BTreeSet<(String, String)>,
    /// Products contraindicated by at least one declared condition.
    pub excluded: BTreeSet<String>,
    /// Symptom tokens with no indication entry. Reported, never matched.
    pub unknown_symptomes: BTreeSet<String>,
    /// Condition tokens with no contraindication entry.
    pub unknown_conditions: BTreeSet<String>,
}

/// Deterministic, pure: same tokens + same index → same output.
pub fn infer(
    symptom_tokens: &[String],
    condition_tokens: &[String],
    index: &CatalogueIndex,
) -> Inference {
    let mut inference = Inference::default();

    for condition in condition_tokens {
        match index.unsafe_under(condition) {
            Some(products) => {
                inference.excluded.extend(products.iter().cloned());
            }
            None => {
                inference.unknown_conditions.insert(condition.clone());
            }
        }
    }

    for symptom in symptom_tokens {
        match index.treated_by(symptom) {
            Some(products) => {
                for product in products {
                    if inference.excluded.contains(product) {
                        continue;
                    }
                    inference
                        .matches
                        .insert((product.clone(), symptom.clone()));
                }
            }
            None => {
                inference.unknown_symptomes.insert(symptom.clone());
            }
        }
    }

    inference
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::test_fixtures::sample_catalogue;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn index() -> CatalogueIndex {
        CatalogueIndex::build(&sample_catalogue())
    }

    #[test]
    fn matches_without_conditions() {
        let inference = infer(&tokens(&["depression"]), &[], &index());

        assert!(inference
            .matches
            .contains(&("5-HTP".into(), "depression".into())));
        assert!(inference
            .matches
            .contains(&("Millepertuis (St. John's Wort)".into(), "depression".into())));
        assert!(inference.excluded.is_empty());
        assert!(inference.unknown_symptomes.is_empty());
    }

    #[test]
    fn excluded_product_never_matches() {
        let inference = infer(
            &tokens(&["depression"]),
            &tokens(&["contraceptifs"]),
            &index(),
        );

        assert!(inference
            .excluded
            .contains("Millepertuis (St. John's Wort)"));
        assert!(!inference
            .matches
            .iter()
            .any(|(product, _)| product == "Millepertuis (St. John's Wort)"));
        // The safe alternative survives.
        assert!(inference
            .matches
            .contains(&("5-HTP".into(), "depression".into())));
    }

    #[test]
    fn pregnancy_excludes_across_symptoms() {
        let inference = infer(
            &tokens(&["fatigue", "stress"]),
            &tokens(&["grossesse"]),
            &index(),
        );

        for product in ["Guarana", "5-HTP", "Millepertuis (St. John's Wort)"] {
            assert!(inference.excluded.contains(product), "{product} not excluded");
        }
        assert!(inference
            .matches
            .contains(&("Magnésium Bisglycinate".into(), "fatigue".into())));
        assert!(inference
            .matches
            .contains(&("Yoga Nidra (Méditation)".into(), "stress".into())));
    }

    #[test]
    fn unknown_tokens_are_reported_not_matched() {
        let inference = infer(&tokens(&["zzz"]), &tokens(&["yyy"]), &index());

        assert_eq!(inference.unknown_symptomes, tokens(&["zzz"]).into_iter().collect());
        assert_eq!(inference.unknown_conditions, tokens(&["yyy"]).into_iter().collect());
        assert!(inference.matches.is_empty());
        assert!(inference.excluded.is_empty());
    }

    #[test]
    fn repeated_symptom_produces_one_match_pair() {
        let inference = infer(&tokens(&["depression", "depression"]), &[], &index());
        let htp_matches = inference
            .matches
            .iter()
            .filter(|(product, _)| product == "5-HTP")
            .count();
        assert_eq!(htp_matches, 1);
    }

    #[test]
    fn no_state_carries_across_calls() {
        let idx = index();
        let first = infer(&tokens(&["depression"]), &tokens(&["grossesse"]), &idx);
        assert!(!first.excluded.is_empty());

        let second = infer(&tokens(&["depression"]), &[], &idx);
        assert!(second.excluded.is_empty());
        assert!(second
            .matches
            .iter()
            .any(|(product, _)| product == "5-HTP"));
    }
}
