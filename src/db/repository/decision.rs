use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Decision, DecisionQuery};

use super::parse_uuid;

/// A decision as persisted for one user: query echo, computed payload,
/// version marker. The id is the `recommendation_id` intake records point at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDecision {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source: String,
    pub input: DecisionQuery,
    pub decision: Decision,
    pub created_at: DateTime<Utc>,
}

impl StoredDecision {
    pub fn new(user_id: Uuid, source: &str, input: DecisionQuery, decision: Decision) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            source: source.to_string(),
            input,
            decision,
            created_at: Utc::now(),
        }
    }
}

pub fn insert_decision(conn: &Connection, stored: &StoredDecision) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO decisions (id, user_id, source, input_json, decision_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            stored.id.to_string(),
            stored.user_id.to_string(),
            stored.source,
            serde_json::to_string(&stored.input)?,
            serde_json::to_string(&stored.decision)?,
            stored.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_decision(
    conn: &Connection,
    user_id: Uuid,
    decision_id: Uuid,
) -> Result<StoredDecision, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, user_id, source, input_json, decision_json, created_at
             FROM decisions WHERE id = ?1 AND user_id = ?2",
            params![decision_id.to_string(), user_id.to_string()],
            decision_row,
        )
        .optional()?;

    let raw = row.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "decision".to_string(),
        id: decision_id.to_string(),
    })?;
    decision_from_row(raw)
}

/// Replace the stored decision payload (used after intake annotation).
pub fn update_decision_payload(
    conn: &Connection,
    user_id: Uuid,
    decision_id: Uuid,
    decision: &Decision,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE decisions SET decision_json = ?1 WHERE id = ?2 AND user_id = ?3",
        params![
            serde_json::to_string(decision)?,
            decision_id.to_string(),
            user_id.to_string(),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "decision".to_string(),
            id: decision_id.to_string(),
        });
    }
    Ok(())
}

pub fn list_decisions(
    conn: &Connection,
    user_id: Uuid,
    limit: usize,
) -> Result<Vec<StoredDecision>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, source, input_json, decision_json, created_at
         FROM decisions WHERE user_id = ?1
         ORDER BY created_at DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![user_id.to_string(), limit as i64], decision_row)?;

    let mut decisions = Vec::new();
    for row in rows {
        decisions.push(decision_from_row(row?)?);
    }
    Ok(decisions)
}

struct DecisionRow {
    id: String,
    user_id: String,
    source: String,
    input_json: String,
    decision_json: String,
    created_at: DateTime<Utc>,
}

fn decision_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DecisionRow> {
    Ok(DecisionRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        source: row.get(2)?,
        input_json: row.get(3)?,
        decision_json: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn decision_from_row(row: DecisionRow) -> Result<StoredDecision, DatabaseError> {
    Ok(StoredDecision {
        id: parse_uuid("decisions.id", &row.id)?,
        user_id: parse_uuid("decisions.user_id", &row.user_id)?,
        source: row.source,
        input: serde_json::from_str(&row.input_json)?,
        decision: serde_json::from_str(&row.decision_json)?,
        created_at: row.created_at,
    })
}
