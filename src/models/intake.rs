use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One adherence entry: "user took product X for goal Y at time T".
/// Created by user action or carry-over, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// The decision this entry belongs to (version marker).
    pub recommendation_id: Uuid,
    /// Synthetic `goal::product` id, when the client supplied or derived one.
    pub supplement_id: Option<String>,
    pub supplement_name: String,
    pub objective_key: Option<String>,
    pub objective_label: Option<String>,
    pub taken: bool,
    pub taken_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl IntakeRecord {
    /// Goal key of this record: the stored objective, or the prefix of a
    /// synthetic `goal::raw` supplement id when the objective is absent.
    pub fn goal_key(&self) -> Option<&str> {
        if let Some(key) = self.objective_key.as_deref() {
            let key = key.trim();
            if !key.is_empty() {
                return Some(key);
            }
        }
        self.supplement_id
            .as_deref()
            .and_then(|id| id.split_once("::"))
            .map(|(goal, _)| goal.trim())
            .filter(|goal| !goal.is_empty())
    }
}
