use serde::{Deserialize, Serialize};

/// Medical sub-profile. Every field is optional; absent means unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicalInfo {
    #[serde(default)]
    pub is_pregnant: Option<bool>,
    #[serde(default)]
    pub is_breastfeeding: Option<bool>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub diseases: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

/// The slice of a user profile the decision engine reads. Account identity,
/// personal details and persistence live in the surrounding system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub symptomes: Vec<String>,
    #[serde(default)]
    pub medical: MedicalInfo,
}
