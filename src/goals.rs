//! Fixed goal taxonomy: canonical user-facing objectives resolved from
//! free-form labels and aliases.
//!
//! The taxonomy decouples the public goal vocabulary from the catalogue's
//! raw wording, so catalogue labels can drift without breaking clients.
//! It is built once at startup and shared read-only.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalogue::{fold_text, normalize_token};

/// One canonical goal: identifier, display label, candidate catalogue tokens
/// in preference order, and the alias strings that resolve to it.
#[derive(Debug, Clone, Copy)]
pub struct GoalSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub symptom_candidates: &'static [&'static str],
    pub aliases: &'static [&'static str],
}

/// Registry order is the public iteration and tie-break order. Alias sets
/// are disjoint across goals; the builder rejects collisions, since a
/// colliding alias would make the later goal silently unreachable.
static GOAL_SPECS: &[GoalSpec] = &[
    GoalSpec {
        id: "sleep_support",
        label: "Ameliorer mon sommeil",
        symptom_candidates: &["sommeil", "insomnie", "sleep"],
        aliases: &[
            "sleep support",
            "sleep health",
            "sante du sommeil",
            "sommeil",
            "insomnie",
            "insomnia",
            "narcolepsy",
            "terreurs nocturnes",
        ],
    },
    GoalSpec {
        id: "stress_anxiety_support",
        label: "Gerer le stress et l'anxiete",
        symptom_candidates: &["stress", "anxiete", "trouble"],
        aliases: &[
            "stress anxiety support",
            "stress",
            "anxiete",
            "anxiety",
            "trouble anxieux",
            "trouble d anxiete generalisee",
            "panic disorder",
            "ptsd",
            "trouble de stress post traumatique",
        ],
    },
    GoalSpec {
        id: "mood_depression_support",
        label: "Ameliorer mon humeur",
        symptom_candidates: &["depression", "humeur", "mood"],
        aliases: &[
            "mood depression support",
            "depression",
            "major depressive disorder",
            "trouble depressif majeur",
            "humeur",
            "mood improvement",
            "amelioration de l humeur",
        ],
    },
    GoalSpec {
        id: "energy_fatigue",
        label: "Augmenter mon energie",
        symptom_candidates: &["fatigue", "energie"],
        aliases: &[
            "energy fatigue",
            "fatigue",
            "low energy",
            "muscle recovery",
            "recuperation musculaire",
        ],
    },
    GoalSpec {
        id: "focus_cognition",
        label: "Ameliorer ma concentration et memoire",
        symptom_candidates: &["concentration", "cognitive", "memoire"],
        aliases: &[
            "focus cognition",
            "amelioration cognitive",
            "cognitive improvement",
            "concentration et attention",
            "memoire",
            "attention deficit hyperactivity disorder",
        ],
    },
    GoalSpec {
        id: "weight_loss",
        label: "Perdre du poids",
        symptom_candidates: &["perte", "obesite", "obesity", "surpoids"],
        aliases: &[
            "weight loss",
            "perte de poids",
            "perte de poids et maintien",
            "obesite",
            "obesity",
            "surpoids",
            "prediabetes",
            "syndrome metabolique",
        ],
    },
    GoalSpec {
        id: "appetite_control",
        label: "Controler mon appetit",
        symptom_candidates: &["surpoids", "obesite", "perte"],
        aliases: &["appetite control", "controle de l appetit"],
    },
    GoalSpec {
        id: "digestion_gut",
        label: "Ameliorer ma digestion",
        symptom_candidates: &["digestive", "intestin", "constipation"],
        aliases: &[
            "digestion gut",
            "sante digestive",
            "digestive health",
            "constipation",
            "syndrome de l intestin irritable",
            "ibs",
            "reflux gastro oesophagien",
        ],
    },
    GoalSpec {
        id: "immune_support",
        label: "Renforcer mon immunite",
        symptom_candidates: &["immunitaire", "grippe", "infection"],
        aliases: &[
            "immune support",
            "sante immunitaire",
            "immunite",
            "infection respiratoire aigue",
            "grippe",
            "rhume",
        ],
    },
    GoalSpec {
        id: "muscle_gain_strength",
        label: "Gagner en muscle et force",
        symptom_candidates: &["taille", "muscle", "force"],
        aliases: &[
            "muscle gain strength",
            "taille et force musculaires",
            "muscle size strength",
            "performance athletique generale",
        ],
    },
    GoalSpec {
        id: "pain_inflammation",
        label: "Reduire douleurs et inflammations",
        symptom_candidates: &["douleur", "arthrose", "arthrite"],
        aliases: &[
            "pain inflammation",
            "douleur",
            "douleur chronique",
            "arthrose",
            "osteoarthritis",
            "arthrite",
            "fibromyalgie",
        ],
    },
    GoalSpec {
        id: "migraine_headache",
        label: "Prevenir migraines et maux de tete",
        symptom_candidates: &["migraine", "cephalee"],
        aliases: &[
            "migraine headache",
            "migraine",
            "cephalee migraineuse",
            "tinnitus",
            "acouphene",
        ],
    },
];

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("Goal alias '{alias}' claimed by both '{first}' and '{second}'")]
    AliasCollision {
        alias: String,
        first: String,
        second: String,
    },
}

/// Public `{id, label}` pair for goal pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalOption {
    pub id: String,
    pub label: String,
}

/// Immutable goal registry with folded-alias and symptom-token lookup maps.
#[derive(Debug)]
pub struct GoalTaxonomy {
    specs: &'static [GoalSpec],
    by_id: HashMap<&'static str, &'static GoalSpec>,
    alias_to_goal: HashMap<String, &'static str>,
    symptom_to_goals: HashMap<String, Vec<&'static str>>,
}

impl GoalTaxonomy {
    /// Build the process-wide taxonomy from the fixed registry.
    pub fn builtin() -> Result<Self, TaxonomyError> {
        Self::from_specs(GOAL_SPECS)
    }

    fn from_specs(specs: &'static [GoalSpec]) -> Result<Self, TaxonomyError> {
        let mut by_id = HashMap::new();
        let mut alias_to_goal: HashMap<String, &'static str> = HashMap::new();
        let mut symptom_to_goals: HashMap<String, Vec<&'static str>> = HashMap::new();

        for spec in specs {
            by_id.insert(spec.id, spec);

            // The id and label are implicit aliases.
            let aliases = [spec.id, spec.label].into_iter().chain(spec.aliases.iter().copied());
            for alias in aliases {
                let key = fold_text(alias);
                if key.is_empty() {
                    continue;
                }
                if let Some(owner) = alias_to_goal.get(key.as_str()) {
                    if *owner != spec.id {
                        return Err(TaxonomyError::AliasCollision {
                            alias: key,
                            first: (*owner).to_string(),
                            second: spec.id.to_string(),
                        });
                    }
                    continue;
                }
                alias_to_goal.insert(key, spec.id);
            }

            for candidate in spec.symptom_candidates {
                let token = normalize_token(candidate);
                if token.is_empty() {
                    continue;
                }
                let goals = symptom_to_goals.entry(token).or_default();
                if !goals.contains(&spec.id) {
                    goals.push(spec.id);
                }
            }
        }

        Ok(Self {
            specs,
            by_id,
            alias_to_goal,
            symptom_to_goals,
        })
    }

    /// One `{id, label}` entry per goal, stable registry order.
    pub fn options(&self) -> Vec<GoalOption> {
        self.specs
            .iter()
            .map(|spec| GoalOption {
                id: spec.id.to_string(),
                label: spec.label.to_string(),
            })
            .collect()
    }

    pub fn label(&self, goal_id: &str) -> Option<&'static str> {
        self.by_id.get(goal_id).map(|spec| spec.label)
    }

    /// Resolve free text to a canonical goal id. Exact folded-alias match
    /// first; otherwise the text's token, first claiming goal in registry
    /// order. Many-to-one, never ambiguous for the caller.
    pub fn canonicalize(&self, text: &str) -> Option<&'static str> {
        let key = fold_text(text);
        if key.is_empty() {
            return None;
        }
        if let Some(goal) = self.alias_to_goal.get(key.as_str()) {
            return Some(*goal);
        }

        let token = normalize_token(text);
        if token.is_empty() {
            return None;
        }
        self.symptom_to_goals
            .get(token.as_str())
            .and_then(|goals| goals.first().copied())
    }

    /// Map, drop unresolved, dedupe preserving first-seen order.
    pub fn canonicalize_list<S: AsRef<str>>(&self, values: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for value in values {
            if let Some(goal) = self.canonicalize(value.as_ref()) {
                if seen.insert(goal) {
                    out.push(goal.to_string());
                }
            }
        }
        out
    }

    /// Every goal claiming the token of `text`, registry order.
    pub fn goals_for_symptom(&self, text: &str) -> Vec<&'static str> {
        let token = normalize_token(text);
        if token.is_empty() {
            return Vec::new();
        }
        self.symptom_to_goals
            .get(token.as_str())
            .cloned()
            .unwrap_or_default()
    }

    /// Probe tokens for the given goals: per goal the first candidate found
    /// in `known_symptoms`, else the first candidate unconditionally, so an
    /// unbacked goal still yields a deterministic token. Output deduped in
    /// goal input order.
    pub fn symptoms_for_goals<S: AsRef<str>>(
        &self,
        goal_ids: &[S],
        known_symptoms: &HashSet<String>,
    ) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for goal_id in goal_ids {
            let Some(spec) = self.by_id.get(goal_id.as_ref()) else {
                continue;
            };

            let mut candidates = Vec::new();
            for raw in spec.symptom_candidates {
                let token = normalize_token(raw);
                if !token.is_empty() && !candidates.contains(&token) {
                    candidates.push(token);
                }
            }

            let selected = candidates
                .iter()
                .find(|token| known_symptoms.contains(*token))
                .or_else(|| candidates.first());

            if let Some(token) = selected {
                if seen.insert(token.clone()) {
                    out.push(token.clone());
                }
            }
        }

        out
    }
}
