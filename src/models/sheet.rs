use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One declared indication: a health condition or goal the sheet addresses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicationEntry {
    #[serde(default)]
    pub health_condition_or_goal: Option<String>,
}

/// Pregnancy/lactation safety note. Free text in the catalogue; the index
/// applies a keyword heuristic on `condition` + `safety_information`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PregnancyLactationEntry {
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub safety_information: Option<String>,
}

/// Drug/agent interaction declared by a sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionEntry {
    #[serde(default)]
    pub agent: Option<String>,
}

/// Population-level precaution declared by a sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrecautionEntry {
    #[serde(default)]
    pub population_condition: Option<String>,
}

/// Safety block of a sheet. Every sub-list is absent-tolerant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyProfile {
    #[serde(default)]
    pub pregnancy_lactation: Vec<PregnancyLactationEntry>,
    #[serde(default)]
    pub interactions: Vec<InteractionEntry>,
    #[serde(default)]
    pub precautions: Vec<PrecautionEntry>,
}

/// One catalogue entry: a supplement, practice or diet, its indications and
/// its safety data. `name` is the unique (case-insensitive) product key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub database: Vec<IndicationEntry>,
    #[serde(default)]
    pub safety: SafetyProfile,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Catalogue category holding supplement sheets (the trackable subset).
pub const CATEGORY_SUPPLEMENTS: &str = "complement_alimentaire";
/// Catalogue category holding sport and practice sheets.
pub const CATEGORY_PRACTICES: &str = "sport_et_pratique";
/// Catalogue category holding diet sheets.
pub const CATEGORY_DIETS: &str = "regime_alimentaire";

/// The full catalogue: category key → sheets. Read-only to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalogue {
    pub categories: BTreeMap<String, Vec<Sheet>>,
}

impl Catalogue {
    /// All sheets across categories, in category-key then file order.
    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.categories.values().flatten()
    }

    pub fn category(&self, key: &str) -> &[Sheet] {
        self.categories.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, category: &str, sheet: Sheet) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .push(sheet);
    }
}
