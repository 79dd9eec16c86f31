//! Decision service: owns the immutable catalogue index and goal taxonomy,
//! computes decisions for raw queries or user profiles, and drives the
//! intake persistence flows.
//!
//! Index and taxonomy are built once at startup and shared without locking;
//! decision computation is pure and may run on many threads at once. The
//! async entry point dispatches onto the blocking pool so a long catalogue
//! never stalls the request-handling runtime.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::carryover;
use crate::catalogue::CatalogueIndex;
use crate::db::repository::{
    get_decision, insert_intakes, update_decision_payload, StoredDecision,
};
use crate::db::DatabaseError;
use crate::goals::{GoalOption, GoalTaxonomy};
use crate::intake::{ensure_taken_times, record_intake, TrackableProducts};
use crate::models::{Catalogue, Decision, DecisionQuery, IntakeRecord, UserProfile};
use crate::ranker::{augment_with_goals, decide};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("No usable symptoms or goals in the profile")]
    EmptyQuery,

    #[error("Invalid supplement name at intakes[{index}]")]
    InvalidSupplementName { index: usize },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Decision worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// One intake entry as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeRequest {
    #[serde(default)]
    pub supplement_id: Option<String>,
    pub supplement_name: String,
    #[serde(default)]
    pub objective_key: Option<String>,
    #[serde(default)]
    pub objective_label: Option<String>,
    #[serde(default = "default_taken")]
    pub taken: bool,
    #[serde(default)]
    pub taken_at: Option<DateTime<Utc>>,
}

fn default_taken() -> bool {
    true
}

#[derive(Clone)]
pub struct DecisionService {
    index: Arc<CatalogueIndex>,
    taxonomy: Arc<GoalTaxonomy>,
    trackable: Arc<TrackableProducts>,
    known_symptoms: Arc<HashSet<String>>,
}

impl DecisionService {
    pub fn new(catalogue: &Catalogue, taxonomy: GoalTaxonomy) -> Self {
        let index = CatalogueIndex::build(catalogue);
        let known_symptoms = index.known_symptom_tokens().map(String::from).collect();
        Self {
            index: Arc::new(index),
            taxonomy: Arc::new(taxonomy),
            trackable: Arc::new(TrackableProducts::from_catalogue(catalogue)),
            known_symptoms: Arc::new(known_symptoms),
        }
    }

    pub fn goal_options(&self) -> Vec<GoalOption> {
        self.taxonomy.options()
    }

    pub fn taxonomy(&self) -> &GoalTaxonomy {
        &self.taxonomy
    }

    /// Plain decision, no goal augmentation.
    pub fn decide(&self, query: &DecisionQuery) -> Decision {
        decide(query, &self.index)
    }

    /// Decision with goal augmentation and taken-times slots initialized.
    pub fn decide_with_goals(&self, query: &DecisionQuery, declared_goals: &[String]) -> Decision {
        let mut decision = decide(query, &self.index);
        augment_with_goals(&mut decision, declared_goals, &self.taxonomy);
        ensure_taken_times(&mut decision, &self.trackable);
        decision
    }

    /// Same computation, dispatched onto the blocking pool.
    pub async fn decide_detached(&self, query: DecisionQuery) -> Result<Decision, ServiceError> {
        let service = self.clone();
        let decision =
            tokio::task::spawn_blocking(move || service.decide(&query)).await?;
        Ok(decision)
    }

    /// Assemble a decision query from a profile: declared goals and symptom
    /// lists feed the symptom side (goals additionally contribute their
    /// catalogue probe tokens); medical lists and the pregnancy/
    /// breastfeeding flags feed the condition side.
    pub fn profile_query(&self, profile: &UserProfile) -> DecisionQuery {
        let mut symptomes = clean_text_list(&profile.goals);
        symptomes.extend(clean_text_list(&profile.symptomes));

        let goal_ids = self.taxonomy.canonicalize_list(&profile.goals);
        symptomes.extend(
            self.taxonomy
                .symptoms_for_goals(&goal_ids, &self.known_symptoms),
        );

        let medical = &profile.medical;
        let mut conditions = clean_text_list(&medical.conditions);
        conditions.extend(clean_text_list(&medical.diseases));
        conditions.extend(clean_text_list(&medical.medications));
        conditions.extend(clean_text_list(&medical.allergies));
        if medical.is_pregnant == Some(true) {
            conditions.push("grossesse".to_string());
        }
        if medical.is_breastfeeding == Some(true) {
            conditions.push("allaitement".to_string());
        }

        DecisionQuery {
            symptomes: dedupe_keep_order(symptomes),
            conditions_medicales: dedupe_keep_order(conditions),
        }
    }

    /// Full profile flow: build the query, refuse an empty symptom side,
    /// decide and augment with the profile's declared goals.
    pub fn decide_for_profile(&self, profile: &UserProfile) -> Result<Decision, ServiceError> {
        let query = self.profile_query(profile);
        if query.symptomes.is_empty() {
            return Err(ServiceError::EmptyQuery);
        }
        Ok(self.decide_with_goals(&query, &profile.goals))
    }

    /// Persist a bulk of intake entries against a stored decision and
    /// annotate the stored payload's taken-times in the same pass.
    pub fn save_intakes(
        &self,
        conn: &mut Connection,
        user_id: Uuid,
        decision_id: Uuid,
        intakes: &[IntakeRequest],
    ) -> Result<(Vec<IntakeRecord>, Decision), ServiceError> {
        let stored: StoredDecision = get_decision(conn, user_id, decision_id)?;
        let mut decision = stored.decision;
        ensure_taken_times(&mut decision, &self.trackable);

        let now = Utc::now();
        let mut records = Vec::with_capacity(intakes.len());

        for (i, intake) in intakes.iter().enumerate() {
            let name = intake.supplement_name.trim();
            if name.is_empty() {
                return Err(ServiceError::InvalidSupplementName { index: i });
            }
            let taken_at = intake.taken_at.unwrap_or(now);

            records.push(IntakeRecord {
                id: Uuid::new_v4(),
                user_id,
                recommendation_id: decision_id,
                supplement_id: clean_optional(&intake.supplement_id),
                supplement_name: name.to_string(),
                objective_key: clean_optional(&intake.objective_key),
                objective_label: clean_optional(&intake.objective_label),
                taken: intake.taken,
                taken_at,
                created_at: now,
            });

            if intake.taken {
                record_intake(&mut decision, &self.trackable, name, taken_at);
            }
        }

        insert_intakes(conn, &records)?;
        update_decision_payload(conn, user_id, decision_id, &decision)?;

        tracing::debug!(
            user_id = %user_id,
            decision_id = %decision_id,
            saved = records.len(),
            "Intake batch saved"
        );
        Ok((records, decision))
    }

    /// Migrate intake history from a prior decision version onto a new one.
    pub fn carry_over_intakes(
        &self,
        conn: &mut Connection,
        user_id: Uuid,
        from_decision_id: Uuid,
        to_decision_id: Uuid,
        to_decision: &Decision,
    ) -> Result<Vec<IntakeRecord>, ServiceError> {
        let migrated = carryover::carry_over(
            conn,
            &self.taxonomy,
            user_id,
            from_decision_id,
            to_decision_id,
            to_decision,
        )?;
        Ok(migrated)
    }
}

fn clean_text_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(String::from)
        .collect()
}

fn clean_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

fn dedupe_keep_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.to_lowercase()))
        .collect()
}
