//! Adherence annotation on sealed decisions.
//!
//! Only trackable products (supplement sheets) carry taken-times lists.
//! Annotation is append-only: no dedupe, no resorting — chronological order
//! is the caller's responsibility.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::{Catalogue, Decision, Recommendation, CATEGORY_SUPPLEMENTS};

/// Case-folded names of the products whose intake can be tracked. Built once
/// from the catalogue at startup.
#[derive(Debug, Clone, Default)]
pub struct TrackableProducts {
    names: HashSet<String>,
}

impl TrackableProducts {
    pub fn from_catalogue(catalogue: &Catalogue) -> Self {
        let names = catalogue
            .category(CATEGORY_SUPPLEMENTS)
            .iter()
            .map(|sheet| sheet.name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_lowercase)
            .collect();
        Self { names }
    }

    pub fn contains(&self, product_name: &str) -> bool {
        self.names.contains(&product_name.trim().to_lowercase())
    }
}

/// Ensure taken-times lists exist where they belong: on every
/// recommendation entry, and on the best decision when it is trackable.
pub fn ensure_taken_times(decision: &mut Decision, trackable: &TrackableProducts) {
    for rec in &mut decision.recommendations {
        rec.complement_taken_times.get_or_insert_with(Vec::new);
    }
    if let Some(best) = decision.best_decision.as_mut() {
        if trackable.contains(&best.produit) {
            best.complement_taken_times.get_or_insert_with(Vec::new);
        }
    }
}

/// Append `taken_at` to every entry of the decision whose name case-folds to
/// `product_name`, provided the product is trackable. Returns the number of
/// entries annotated (0 means nothing matched or not trackable).
pub fn record_intake(
    decision: &mut Decision,
    trackable: &TrackableProducts,
    product_name: &str,
    taken_at: DateTime<Utc>,
) -> usize {
    if !trackable.contains(product_name) {
        return 0;
    }

    let key = product_name.trim().to_lowercase();
    let mut annotated = 0;

    for rec in &mut decision.recommendations {
        annotated += annotate(rec, &key, taken_at);
    }
    if let Some(best) = decision.best_decision.as_mut() {
        annotated += annotate(best, &key, taken_at);
    }

    if annotated > 0 {
        tracing::debug!(product = product_name, entries = annotated, "Intake recorded");
    }
    annotated
}

fn annotate(rec: &mut Recommendation, key: &str, taken_at: DateTime<Utc>) -> usize {
    if rec.produit.trim().to_lowercase() != key {
        return 0;
    }
    rec.complement_taken_times
        .get_or_insert_with(Vec::new)
        .push(taken_at);
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::test_fixtures::sample_catalogue;
    use crate::catalogue::CatalogueIndex;
    use crate::models::DecisionQuery;
    use crate::ranker::decide;

    fn fixture() -> (Decision, TrackableProducts) {
        let catalogue = sample_catalogue();
        let index = CatalogueIndex::build(&catalogue);
        let decision = decide(
            &DecisionQuery::new(["Fatigue", "Stress", "Sommeil"], []),
            &index,
        );
        (decision, TrackableProducts::from_catalogue(&catalogue))
    }

    #[test]
    fn trackable_set_is_supplements_only() {
        let trackable = TrackableProducts::from_catalogue(&sample_catalogue());
        assert!(trackable.contains("Magnésium Bisglycinate"));
        assert!(trackable.contains("  guarana "));
        assert!(!trackable.contains("Yoga Nidra (Méditation)"));
        assert!(!trackable.contains("Régime Méditerranéen"));
    }

    #[test]
    fn record_appends_to_matching_entries_and_best() {
        let (mut decision, trackable) = fixture();
        ensure_taken_times(&mut decision, &trackable);

        let best_name = decision.best_decision.as_ref().unwrap().produit.clone();
        let at = Utc::now();
        let annotated = record_intake(&mut decision, &trackable, &best_name, at);

        // Best duplicates the top-ranked entry, so both get the timestamp.
        assert_eq!(annotated, 2);
        let best = decision.best_decision.as_ref().unwrap();
        assert_eq!(best.complement_taken_times.as_ref().unwrap(), &vec![at]);
    }

    #[test]
    fn record_is_append_only_without_dedupe() {
        let (mut decision, trackable) = fixture();
        let at = Utc::now();

        record_intake(&mut decision, &trackable, "Magnésium Bisglycinate", at);
        record_intake(&mut decision, &trackable, "magnésium bisglycinate", at);

        let rec = decision
            .recommendations
            .iter()
            .find(|r| r.produit == "Magnésium Bisglycinate")
            .unwrap();
        assert_eq!(rec.complement_taken_times.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn non_trackable_product_is_ignored() {
        let (mut decision, trackable) = fixture();
        let annotated = record_intake(
            &mut decision,
            &trackable,
            "Yoga Nidra (Méditation)",
            Utc::now(),
        );
        assert_eq!(annotated, 0);
        let yoga = decision
            .recommendations
            .iter()
            .find(|r| r.produit == "Yoga Nidra (Méditation)")
            .unwrap();
        assert!(yoga.complement_taken_times.is_none());
    }

    #[test]
    fn ensure_initializes_lists_lazily() {
        let (mut decision, trackable) = fixture();
        assert!(decision.recommendations[0].complement_taken_times.is_none());

        ensure_taken_times(&mut decision, &trackable);
        for rec in &decision.recommendations {
            assert_eq!(rec.complement_taken_times, Some(vec![]));
        }
    }
}
