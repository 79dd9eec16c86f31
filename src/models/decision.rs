use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw decision input as submitted by the caller: free text, case-insensitive,
/// whitespace-trimmed. Deduplication happens inside the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionQuery {
    pub symptomes: Vec<String>,
    #[serde(default)]
    pub conditions_medicales: Vec<String>,
}

impl DecisionQuery {
    pub fn new<S: Into<String>>(
        symptomes: impl IntoIterator<Item = S>,
        conditions: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            symptomes: symptomes.into_iter().map(Into::into).collect(),
            conditions_medicales: conditions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Echo of the query inside a decision, split into the tokens the engine
/// actually used and the raw inputs it could not map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionInput {
    pub symptomes: Vec<String>,
    pub conditions_medicales: Vec<String>,
    pub symptomes_utilises: Vec<String>,
    pub conditions_utilisees: Vec<String>,
}

/// One ranked product: score = number of distinct covered tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub produit: String,
    pub score: usize,
    pub symptomes_couverts: Vec<String>,
    /// Canonical goal ids this product satisfies (set by goal augmentation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<String>>,
    /// Adherence timestamps for trackable products. Append-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement_taken_times: Option<Vec<DateTime<Utc>>>,
}

impl Recommendation {
    pub fn new(produit: &str, covered: Vec<String>) -> Self {
        Self {
            produit: produit.to_string(),
            score: covered.len(),
            symptomes_couverts: covered,
            goals: None,
            complement_taken_times: None,
        }
    }
}

/// The full output of one recommendation computation. Sealed after creation;
/// only intake annotation and carry-over extend it afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Decision {
    pub input: DecisionInput,
    pub best_decision: Option<Recommendation>,
    pub recommendations: Vec<Recommendation>,
    pub forbidden_products: Vec<String>,
    pub unknown_symptomes: Vec<String>,
    pub unknown_conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations_by_goal: Option<BTreeMap<String, Vec<Recommendation>>>,
}
