//! Intake carry-over: when a user's decision is regenerated, migrate the
//! adherence history onto the matching targets of the new decision.
//!
//! Two storage operations (read prior records, write survivors) with no
//! engine-level transaction. The check-then-act guard against duplicate
//! migration is not atomic under concurrent calls; the unique entry index
//! in the schema is the storage-level backstop.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{has_intakes, insert_intakes, list_intakes};
use crate::db::DatabaseError;
use crate::goals::GoalTaxonomy;
use crate::models::{Decision, IntakeRecord};

/// One migratable slot of the destination decision.
#[derive(Debug, Clone)]
struct CarryTarget {
    synthetic_id: String,
    product_name: String,
    goal_key: String,
    goal_label: Option<String>,
}

/// Migrate prior intake records from `from_decision_id` onto
/// `to_decision`. Returns the newly created records; every guard failure
/// (same version, populated destination, no targets, no overlapping keys)
/// resolves to an empty result, not an error. Only storage failures
/// propagate.
pub fn carry_over(
    conn: &mut Connection,
    taxonomy: &GoalTaxonomy,
    user_id: Uuid,
    from_decision_id: Uuid,
    to_decision_id: Uuid,
    to_decision: &Decision,
) -> Result<Vec<IntakeRecord>, DatabaseError> {
    if from_decision_id == to_decision_id {
        return Ok(Vec::new());
    }
    // At-most-once: a destination that already has entries is left alone.
    if has_intakes(conn, user_id, to_decision_id)? {
        return Ok(Vec::new());
    }

    let targets = build_targets(to_decision, taxonomy);
    if targets.is_empty() {
        return Ok(Vec::new());
    }

    let prior = list_intakes(conn, user_id, from_decision_id)?;

    let now = Utc::now();
    let mut migrated_keys: HashSet<(String, String)> = HashSet::new();
    let mut survivors: Vec<IntakeRecord> = Vec::new();

    // `prior` is most-recent-first, so the first record seen per key is the
    // one that survives.
    for record in &prior {
        let Some(raw_goal) = record.goal_key() else {
            continue;
        };
        let goal_key = taxonomy
            .canonicalize(raw_goal)
            .map(str::to_string)
            .unwrap_or_else(|| raw_goal.to_string());

        let product_key = record.supplement_name.trim().to_lowercase();
        if product_key.is_empty() {
            continue;
        }

        let key = (goal_key, product_key);
        if !migrated_keys.insert(key.clone()) {
            continue;
        }
        let Some(target) = targets.get(&key) else {
            continue;
        };

        survivors.push(IntakeRecord {
            id: Uuid::new_v4(),
            user_id,
            recommendation_id: to_decision_id,
            supplement_id: Some(target.synthetic_id.clone()),
            supplement_name: target.product_name.clone(),
            objective_key: Some(target.goal_key.clone()),
            objective_label: target.goal_label.clone(),
            taken: record.taken,
            taken_at: record.taken_at,
            created_at: now,
        });
    }

    if !survivors.is_empty() {
        insert_intakes(conn, &survivors)?;
    }

    tracing::info!(
        user_id = %user_id,
        from = %from_decision_id,
        to = %to_decision_id,
        migrated = survivors.len(),
        "Intake carry-over complete"
    );
    Ok(survivors)
}

/// (goal key, case-folded product name) → target, first-seen-wins.
fn build_targets(
    decision: &Decision,
    taxonomy: &GoalTaxonomy,
) -> HashMap<(String, String), CarryTarget> {
    let mut targets = HashMap::new();

    let Some(by_goal) = decision.recommendations_by_goal.as_ref() else {
        return targets;
    };

    for (goal, recommendations) in by_goal {
        let Some(goal_key) = taxonomy.canonicalize(goal) else {
            continue;
        };
        let goal_label = taxonomy.label(goal_key).map(str::to_string);

        for rec in recommendations {
            let product_name = rec.produit.trim();
            if product_name.is_empty() {
                continue;
            }
            let key = (goal_key.to_string(), product_name.to_lowercase());
            targets.entry(key).or_insert_with(|| CarryTarget {
                synthetic_id: format!("{goal_key}::{}", product_name.to_lowercase()),
                product_name: product_name.to_string(),
                goal_key: goal_key.to_string(),
                goal_label: goal_label.clone(),
            });
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration};

    use super::*;
    use crate::catalogue::test_fixtures::sample_catalogue;
    use crate::catalogue::CatalogueIndex;
    use crate::db::sqlite::open_memory_database;
    use crate::models::DecisionQuery;
    use crate::ranker::{augment_with_goals, decide};

    fn taxonomy() -> GoalTaxonomy {
        GoalTaxonomy::builtin().unwrap()
    }

    fn augmented_decision() -> Decision {
        let index = CatalogueIndex::build(&sample_catalogue());
        let mut decision = decide(&DecisionQuery::new(["Fatigue", "Stress"], []), &index);
        augment_with_goals(&mut decision, &[], &taxonomy());
        decision
    }

    fn prior_record(
        user: Uuid,
        from: Uuid,
        name: &str,
        objective_key: Option<&str>,
        supplement_id: Option<&str>,
        taken_at: DateTime<Utc>,
    ) -> IntakeRecord {
        IntakeRecord {
            id: Uuid::new_v4(),
            user_id: user,
            recommendation_id: from,
            supplement_id: supplement_id.map(String::from),
            supplement_name: name.to_string(),
            objective_key: objective_key.map(String::from),
            objective_label: None,
            taken: true,
            taken_at,
            created_at: taken_at,
        }
    }

    #[test]
    fn migrates_most_recent_record_per_key() {
        let mut conn = open_memory_database().unwrap();
        let tax = taxonomy();
        let user = Uuid::new_v4();
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let decision = augmented_decision();
        let now = Utc::now();

        insert_intakes(
            &mut conn,
            &[
                prior_record(
                    user,
                    from,
                    "Magnésium Bisglycinate",
                    Some("energy_fatigue"),
                    None,
                    now - Duration::days(2),
                ),
                prior_record(
                    user,
                    from,
                    "Magnésium Bisglycinate",
                    Some("energy_fatigue"),
                    None,
                    now - Duration::days(1),
                ),
            ],
        )
        .unwrap();

        let migrated = carry_over(&mut conn, &tax, user, from, to, &decision).unwrap();

        assert_eq!(migrated.len(), 1);
        let record = &migrated[0];
        assert_eq!(record.recommendation_id, to);
        assert_eq!(record.supplement_name, "Magnésium Bisglycinate");
        assert_eq!(record.objective_key.as_deref(), Some("energy_fatigue"));
        assert_eq!(
            record.objective_label.as_deref(),
            Some("Augmenter mon energie")
        );
        // The most recent taken_at survives, with a fresh created_at.
        assert_eq!(record.taken_at, now - Duration::days(1));
        assert_eq!(list_intakes(&conn, user, to).unwrap().len(), 1);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut conn = open_memory_database().unwrap();
        let tax = taxonomy();
        let user = Uuid::new_v4();
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let decision = augmented_decision();

        insert_intakes(
            &mut conn,
            &[prior_record(
                user,
                from,
                "Guarana",
                Some("energy_fatigue"),
                None,
                Utc::now(),
            )],
        )
        .unwrap();

        let first = carry_over(&mut conn, &tax, user, from, to, &decision).unwrap();
        assert_eq!(first.len(), 1);

        let second = carry_over(&mut conn, &tax, user, from, to, &decision).unwrap();
        assert!(second.is_empty());
        assert_eq!(list_intakes(&conn, user, to).unwrap().len(), 1);
    }

    #[test]
    fn same_version_is_a_no_op() {
        let mut conn = open_memory_database().unwrap();
        let tax = taxonomy();
        let user = Uuid::new_v4();
        let id = Uuid::new_v4();

        let migrated =
            carry_over(&mut conn, &tax, user, id, id, &augmented_decision()).unwrap();
        assert!(migrated.is_empty());
    }

    #[test]
    fn goal_key_parsed_from_synthetic_supplement_id() {
        let mut conn = open_memory_database().unwrap();
        let tax = taxonomy();
        let user = Uuid::new_v4();
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();

        insert_intakes(
            &mut conn,
            &[prior_record(
                user,
                from,
                "Guarana",
                None,
                Some("energy_fatigue::guarana"),
                Utc::now(),
            )],
        )
        .unwrap();

        let migrated =
            carry_over(&mut conn, &tax, user, from, to, &augmented_decision()).unwrap();
        assert_eq!(migrated.len(), 1);
        assert_eq!(migrated[0].objective_key.as_deref(), Some("energy_fatigue"));
        assert_eq!(
            migrated[0].supplement_id.as_deref(),
            Some("energy_fatigue::guarana")
        );
    }

    #[test]
    fn records_without_matching_target_are_skipped() {
        let mut conn = open_memory_database().unwrap();
        let tax = taxonomy();
        let user = Uuid::new_v4();
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();

        insert_intakes(
            &mut conn,
            &[
                // Product absent from the new decision.
                prior_record(
                    user,
                    from,
                    "Mélatonine",
                    Some("sleep_support"),
                    None,
                    Utc::now(),
                ),
                // No goal key anywhere.
                prior_record(user, from, "Guarana", None, None, Utc::now()),
            ],
        )
        .unwrap();

        let migrated =
            carry_over(&mut conn, &tax, user, from, to, &augmented_decision()).unwrap();
        assert!(migrated.is_empty());
    }

    #[test]
    fn decision_without_goal_grouping_yields_no_targets() {
        let mut conn = open_memory_database().unwrap();
        let tax = taxonomy();
        let user = Uuid::new_v4();
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();

        insert_intakes(
            &mut conn,
            &[prior_record(
                user,
                from,
                "Guarana",
                Some("energy_fatigue"),
                None,
                Utc::now(),
            )],
        )
        .unwrap();

        // Plain (non-augmented) decision has no recommendations_by_goal.
        let index = CatalogueIndex::build(&sample_catalogue());
        let plain = decide(&DecisionQuery::new(["Fatigue"], []), &index);

        let migrated = carry_over(&mut conn, &tax, user, from, to, &plain).unwrap();
        assert!(migrated.is_empty());
    }
}
