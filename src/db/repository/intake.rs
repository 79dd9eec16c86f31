use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::IntakeRecord;

use super::parse_uuid;

/// Insert a batch of intake records in one transaction. All-or-nothing: the
/// unique entry index rejects a duplicate batch as a whole.
pub fn insert_intakes(
    conn: &mut Connection,
    records: &[IntakeRecord],
) -> Result<(), DatabaseError> {
    let tx = conn.transaction()?;
    for record in records {
        tx.execute(
            "INSERT INTO intake_records
             (id, user_id, recommendation_id, supplement_id, supplement_name,
              objective_key, objective_label, taken, taken_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id.to_string(),
                record.user_id.to_string(),
                record.recommendation_id.to_string(),
                record.supplement_id,
                record.supplement_name,
                record.objective_key,
                record.objective_label,
                record.taken as i32,
                record.taken_at,
                record.created_at,
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Records for `(user, decision)`, most recent intake first.
pub fn list_intakes(
    conn: &Connection,
    user_id: Uuid,
    recommendation_id: Uuid,
) -> Result<Vec<IntakeRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, recommendation_id, supplement_id, supplement_name,
                objective_key, objective_label, taken, taken_at, created_at
         FROM intake_records
         WHERE user_id = ?1 AND recommendation_id = ?2
         ORDER BY taken_at DESC, created_at DESC",
    )?;
    let rows = stmt.query_map(
        params![user_id.to_string(), recommendation_id.to_string()],
        intake_row,
    )?;

    let mut records = Vec::new();
    for row in rows {
        records.push(intake_from_row(row?)?);
    }
    Ok(records)
}

/// Whether any record exists for `(user, decision)` — the carry-over
/// at-most-once guard.
pub fn has_intakes(
    conn: &Connection,
    user_id: Uuid,
    recommendation_id: Uuid,
) -> Result<bool, DatabaseError> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM intake_records
             WHERE user_id = ?1 AND recommendation_id = ?2)",
        params![user_id.to_string(), recommendation_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists != 0)
}

struct IntakeRow {
    id: String,
    user_id: String,
    recommendation_id: String,
    supplement_id: Option<String>,
    supplement_name: String,
    objective_key: Option<String>,
    objective_label: Option<String>,
    taken: i64,
    taken_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

fn intake_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<IntakeRow> {
    Ok(IntakeRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        recommendation_id: row.get(2)?,
        supplement_id: row.get(3)?,
        supplement_name: row.get(4)?,
        objective_key: row.get(5)?,
        objective_label: row.get(6)?,
        taken: row.get(7)?,
        taken_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn intake_from_row(row: IntakeRow) -> Result<IntakeRecord, DatabaseError> {
    Ok(IntakeRecord {
        id: parse_uuid("intake_records.id", &row.id)?,
        user_id: parse_uuid("intake_records.user_id", &row.user_id)?,
        recommendation_id: parse_uuid("intake_records.recommendation_id", &row.recommendation_id)?,
        supplement_id: row.supplement_id,
        supplement_name: row.supplement_name,
        objective_key: row.objective_key,
        objective_label: row.objective_label,
        taken: row.taken != 0,
        taken_at: row.taken_at,
        created_at: row.created_at,
    })
}
