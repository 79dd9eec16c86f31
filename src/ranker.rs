//! Ranking and decision assembly: aggregates inference matches per product,
//! scores, sorts, selects the best entry and augments results with goal
//! groupings.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::catalogue::{normalize_token, CatalogueIndex};
use crate::engine::{infer, Inference};
use crate::goals::GoalTaxonomy;
use crate::models::{Decision, DecisionInput, DecisionQuery, Recommendation};

/// Aggregate matches per product and order them. Score is the number of
/// distinct covered tokens; ties break on product name, case-folded.
pub fn rank(inference: &Inference) -> Vec<Recommendation> {
    let mut by_product: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (product, symptom) in &inference.matches {
        by_product
            .entry(product.as_str())
            .or_default()
            .insert(symptom.as_str());
    }

    let mut ranked: Vec<Recommendation> = by_product
        .into_iter()
        .map(|(product, covered)| {
            Recommendation::new(product, covered.into_iter().map(String::from).collect())
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.produit.to_lowercase().cmp(&b.produit.to_lowercase()))
    });
    ranked
}

/// The best entry of a ranked list, if any.
pub fn best(ranked: &[Recommendation]) -> Option<&Recommendation> {
    ranked.first()
}

/// Compute a full decision for the given query against an immutable index.
/// Pure except for tracing; safe to run concurrently on a shared index.
pub fn decide(query: &DecisionQuery, index: &CatalogueIndex) -> Decision {
    let symptoms = prepare_inputs(&query.symptomes);
    let conditions = prepare_inputs(&query.conditions_medicales);

    let symptom_tokens = distinct_tokens(&symptoms);
    let condition_tokens = distinct_tokens(&conditions);

    let inference = infer(&symptom_tokens, &condition_tokens, index);

    let (symptomes_utilises, unknown_symptomes) =
        split_known(&symptoms, &symptom_tokens, &inference.unknown_symptomes);
    let (conditions_utilisees, unknown_conditions) =
        split_known(&conditions, &condition_tokens, &inference.unknown_conditions);

    let recommendations = rank(&inference);
    let best_decision = best(&recommendations).cloned();

    tracing::debug!(
        symptomes = symptomes_utilises.len(),
        conditions = conditions_utilisees.len(),
        recommendations = recommendations.len(),
        forbidden = inference.excluded.len(),
        "Decision computed"
    );

    Decision {
        input: DecisionInput {
            symptomes: symptoms.into_iter().map(|(raw, _)| raw).collect(),
            conditions_medicales: conditions.into_iter().map(|(raw, _)| raw).collect(),
            symptomes_utilises,
            conditions_utilisees,
        },
        best_decision,
        recommendations,
        forbidden_products: inference.excluded.into_iter().collect(),
        unknown_symptomes,
        unknown_conditions,
        goals: None,
        recommendations_by_goal: None,
    }
}

/// Trim, drop empties, dedupe case-insensitively keeping first-seen order;
/// pair each kept input with its token.
fn prepare_inputs(values: &[String]) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
            continue;
        }
        out.push((trimmed.to_string(), normalize_token(trimmed)));
    }
    out
}

fn distinct_tokens(inputs: &[(String, String)]) -> Vec<String> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .filter(|(_, token)| !token.is_empty())
        .filter(|(_, token)| seen.insert(token.clone()))
        .map(|(_, token)| token.clone())
        .collect()
}

/// Split prepared inputs into used tokens (input order) and unknown raw
/// inputs (sorted). Raw inputs are echoed for unknowns so the caller sees
/// exactly what it sent, not the normalized form.
fn split_known(
    inputs: &[(String, String)],
    tokens: &[String],
    unknown_tokens: &BTreeSet<String>,
) -> (Vec<String>, Vec<String>) {
    let used = tokens
        .iter()
        .filter(|token| !unknown_tokens.contains(*token))
        .cloned()
        .collect();

    let unknown: BTreeSet<String> = inputs
        .iter()
        .filter(|(_, token)| token.is_empty() || unknown_tokens.contains(token))
        .map(|(raw, _)| raw.clone())
        .collect();

    (used, unknown.into_iter().collect())
}

/// Attach canonical goals to each recommendation and group the list by goal.
///
/// Selected goals come from the caller's declared goals plus whatever the
/// decision input itself canonicalizes to; when that set is non-empty it
/// filters the reverse-lookup goals so unrelated groupings do not appear.
pub fn augment_with_goals(
    decision: &mut Decision,
    declared_goals: &[String],
    taxonomy: &GoalTaxonomy,
) {
    let mut selected = taxonomy.canonicalize_list(declared_goals);
    for goal in taxonomy.canonicalize_list(&decision.input.symptomes) {
        if !selected.contains(&goal) {
            selected.push(goal);
        }
    }

    let mut observed: Vec<String> = Vec::new();
    for rec in &mut decision.recommendations {
        let mut goals: Vec<String> = Vec::new();

        // Explicit goal fields survive re-augmentation, canonicalized.
        if let Some(existing) = rec.goals.take() {
            for goal in taxonomy.canonicalize_list(&existing) {
                if !goals.contains(&goal) {
                    goals.push(goal);
                }
            }
        }

        for token in &rec.symptomes_couverts {
            for goal in taxonomy.goals_for_symptom(token) {
                if !selected.is_empty() && !selected.iter().any(|s| s == goal) {
                    continue;
                }
                if !goals.iter().any(|g| g == goal) {
                    goals.push(goal.to_string());
                }
            }
        }

        for goal in &goals {
            if !observed.contains(goal) {
                observed.push(goal.clone());
            }
        }
        rec.goals = Some(goals);
    }

    let mut by_goal: BTreeMap<String, Vec<Recommendation>> = BTreeMap::new();
    for rec in &decision.recommendations {
        let Some(goals) = rec.goals.as_ref() else {
            continue;
        };
        for goal in goals {
            by_goal.entry(goal.clone()).or_default().push(rec.clone());
        }
    }

    let mut all_goals = selected;
    for goal in observed {
        if !all_goals.contains(&goal) {
            all_goals.push(goal);
        }
    }

    decision.best_decision = decision.recommendations.first().cloned();
    decision.goals = Some(all_goals);
    decision.recommendations_by_goal = Some(by_goal);
}
