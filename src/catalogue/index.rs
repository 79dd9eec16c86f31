//! Immutable fact index over the catalogue: what treats what, and what is
//! unsafe with what. Built once at startup, shared read-only across
//! concurrent decision calls.

use std::collections::{BTreeSet, HashMap};

use crate::models::{Catalogue, Sheet};

use super::normalize::normalize_token;

/// Condition token for pregnancy exclusions.
pub const TOKEN_PREGNANCY: &str = "grossesse";
/// Condition token for breastfeeding exclusions.
pub const TOKEN_BREASTFEEDING: &str = "allaitement";

/// Substrings marking a pregnancy/lactation note as an avoidance. Fixed
/// keyword heuristic preserved verbatim for safety-output parity; any change
/// requires re-validating every exclusion it produces.
const AVOIDANCE_KEYWORDS: &[&str] = &[
    "éviter",
    "eviter",
    "déconseill",
    "deconseill",
    "limiter",
    "éviction",
    "eviction",
];

fn is_avoidance_text(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    AVOIDANCE_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Normalized-token indices over the raw catalogue.
///
/// Matching granularity lives here and nowhere else: each agent/population
/// phrase becomes one whole-phrase token, so two differently-worded agent
/// names yield two non-matching tokens. Exact-ish matching, not fuzzy.
#[derive(Debug, Default)]
pub struct CatalogueIndex {
    /// token → products that treat it.
    indications: HashMap<String, BTreeSet<String>>,
    /// token → products unsafe under that condition.
    contraindications: HashMap<String, BTreeSet<String>>,
}

impl CatalogueIndex {
    pub fn build(catalogue: &Catalogue) -> Self {
        let mut index = Self::default();
        for sheet in catalogue.sheets() {
            index.register_sheet(sheet);
        }
        tracing::debug!(
            indication_tokens = index.indications.len(),
            contraindication_tokens = index.contraindications.len(),
            "Catalogue index built"
        );
        index
    }

    fn register_sheet(&mut self, sheet: &Sheet) {
        let product = sheet.name.trim();
        if product.is_empty() {
            return;
        }

        for entry in &sheet.database {
            if let Some(label) = entry.health_condition_or_goal.as_deref() {
                self.register_indication(label, product);
            }
        }

        for note in &sheet.safety.pregnancy_lactation {
            let condition = note.condition.as_deref().unwrap_or("");
            let information = note.safety_information.as_deref().unwrap_or("");
            let combined = format!("{condition} {information}");
            if !is_avoidance_text(&combined) {
                continue;
            }
            let lowered = combined.to_lowercase();
            if lowered.contains("grossesse") {
                self.register_contraindication_token(TOKEN_PREGNANCY, product);
            }
            if lowered.contains("allait") {
                self.register_contraindication_token(TOKEN_BREASTFEEDING, product);
            }
        }

        for interaction in &sheet.safety.interactions {
            if let Some(agent) = interaction.agent.as_deref() {
                self.register_contraindication(agent, product);
            }
        }

        for precaution in &sheet.safety.precautions {
            if let Some(population) = precaution.population_condition.as_deref() {
                self.register_contraindication(population, product);
            }
        }
    }

    fn register_indication(&mut self, label: &str, product: &str) {
        let token = normalize_token(label);
        if token.is_empty() {
            return;
        }
        self.indications
            .entry(token)
            .or_default()
            .insert(product.to_string());
    }

    fn register_contraindication(&mut self, phrase: &str, product: &str) {
        let token = normalize_token(phrase);
        if token.is_empty() {
            return;
        }
        self.register_contraindication_token(&token, product);
    }

    fn register_contraindication_token(&mut self, token: &str, product: &str) {
        self.contraindications
            .entry(token.to_string())
            .or_default()
            .insert(product.to_string());
    }

    /// Products treating the given token; empty set when unregistered.
    pub fn treated_by(&self, token: &str) -> Option<&BTreeSet<String>> {
        self.indications.get(token)
    }

    /// Products unsafe under the given condition token.
    pub fn unsafe_under(&self, token: &str) -> Option<&BTreeSet<String>> {
        self.contraindications.get(token)
    }

    pub fn is_known_symptom(&self, token: &str) -> bool {
        self.indications.contains_key(token)
    }

    pub fn is_known_condition(&self, token: &str) -> bool {
        self.contraindications.contains_key(token)
    }

    /// Every indexed symptom token. Used by the goal taxonomy to pick which
    /// synonym actually exists in the data.
    pub fn known_symptom_tokens(&self) -> impl Iterator<Item = &str> {
        self.indications.keys().map(String::as_str)
    }

    pub fn known_condition_tokens(&self) -> impl Iterator<Item = &str> {
        self.contraindications.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::test_fixtures::sample_catalogue;
    use crate::models::{
        IndicationEntry, PregnancyLactationEntry, Sheet, CATEGORY_SUPPLEMENTS,
    };

    #[test]
    fn indications_are_tokenized_and_grouped() {
        let index = CatalogueIndex::build(&sample_catalogue());

        let depression = index.treated_by("depression").unwrap();
        assert!(depression.contains("5-HTP"));
        assert!(depression.contains("Millepertuis (St. John's Wort)"));

        let fatigue = index.treated_by("fatigue").unwrap();
        assert!(fatigue.contains("Guarana"));
        assert!(fatigue.contains("Magnésium Bisglycinate"));
    }

    #[test]
    fn interaction_agents_become_whole_phrase_tokens() {
        let index = CatalogueIndex::build(&sample_catalogue());
        let pill = index.unsafe_under("contraceptifs").unwrap();
        assert!(pill.contains("Millepertuis (St. John's Wort)"));
        // Differently-worded agents do not collapse into each other.
        assert!(index.unsafe_under("anticoagulants").is_some());
    }

    #[test]
    fn pregnancy_heuristic_requires_avoidance_keyword() {
        let mut catalogue = Catalogue::default();

        let mut risky = Sheet::new("Guarana");
        risky.safety.pregnancy_lactation.push(PregnancyLactationEntry {
            condition: Some("Grossesse".into()),
            safety_information: Some("Déconseillé pendant la grossesse".into()),
        });

        let mut benign = Sheet::new("Camomille");
        benign.safety.pregnancy_lactation.push(PregnancyLactationEntry {
            condition: Some("Grossesse".into()),
            safety_information: Some("Aucune donnée défavorable connue".into()),
        });

        catalogue.insert(CATEGORY_SUPPLEMENTS, risky);
        catalogue.insert(CATEGORY_SUPPLEMENTS, benign);
        let index = CatalogueIndex::build(&catalogue);

        let pregnant = index.unsafe_under(TOKEN_PREGNANCY).unwrap();
        assert!(pregnant.contains("Guarana"));
        assert!(!pregnant.contains("Camomille"));
    }

    #[test]
    fn lactation_registered_separately_from_pregnancy() {
        let mut catalogue = Catalogue::default();
        let mut sheet = Sheet::new("Millepertuis (St. John's Wort)");
        sheet.safety.pregnancy_lactation.push(PregnancyLactationEntry {
            condition: Some("Allaitement".into()),
            safety_information: Some("À éviter pendant l'allaitement".into()),
        });
        catalogue.insert(CATEGORY_SUPPLEMENTS, sheet);
        let index = CatalogueIndex::build(&catalogue);

        assert!(index
            .unsafe_under(TOKEN_BREASTFEEDING)
            .unwrap()
            .contains("Millepertuis (St. John's Wort)"));
        assert!(index.unsafe_under(TOKEN_PREGNANCY).is_none());
    }

    #[test]
    fn absent_fields_are_empty_not_errors() {
        let mut catalogue = Catalogue::default();
        catalogue.insert(CATEGORY_SUPPLEMENTS, Sheet::new("Vide"));
        catalogue.insert(
            CATEGORY_SUPPLEMENTS,
            Sheet {
                name: "  ".into(),
                database: vec![IndicationEntry {
                    health_condition_or_goal: Some("Stress".into()),
                }],
                ..Default::default()
            },
        );
        let index = CatalogueIndex::build(&catalogue);
        // Nameless sheet is skipped entirely; empty sheet registers nothing.
        assert!(index.treated_by("stress").is_none());
    }

    #[test]
    fn known_token_sets_reflect_both_indices() {
        let index = CatalogueIndex::build(&sample_catalogue());
        assert!(index.is_known_symptom("sommeil"));
        assert!(!index.is_known_symptom("grossesse"));
        assert!(index.is_known_condition("grossesse"));
        assert!(index.is_known_condition("hypertension"));
        assert!(!index.is_known_condition("zzz"));
    }
}
