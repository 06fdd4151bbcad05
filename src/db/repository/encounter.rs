use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::patient_exists;
use crate::db::DatabaseError;
use crate::models::timestamp;
use crate::models::*;

const ENCOUNTER_COLUMNS: &str = "id, patient_id, created_at, chief_complaint, hpi, exam,
    diagnosis, plan, va_od, va_os, iop_od, iop_os";

type EncounterRow = (i64, i64, String, [String; 9]);

fn encounter_from_row(row: &Row<'_>) -> rusqlite::Result<EncounterRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        [
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
        ],
    ))
}

fn build_encounter((id, patient_id, created_at, fields): EncounterRow) -> Result<Encounter, DatabaseError> {
    let [chief_complaint, hpi, exam, diagnosis, plan, va_od, va_os, iop_od, iop_os] = fields;
    Ok(Encounter {
        id,
        patient_id,
        created_at: timestamp::from_storage(&created_at)?,
        chief_complaint,
        hpi,
        exam,
        diagnosis,
        plan,
        va_od,
        va_os,
        iop_od,
        iop_os,
    })
}

/// Records an encounter for an existing patient.
pub fn insert_encounter(
    conn: &Connection,
    patient_id: i64,
    input: &EncounterCreate,
    created_at: DateTime<Utc>,
) -> Result<Encounter, DatabaseError> {
    if !patient_exists(conn, patient_id)? {
        return Err(DatabaseError::not_found("Patient", patient_id));
    }
    conn.execute(
        "INSERT INTO encounters (patient_id, created_at, chief_complaint, hpi, exam,
                                 diagnosis, plan, va_od, va_os, iop_od, iop_os)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            patient_id,
            timestamp::to_storage(&created_at),
            input.chief_complaint,
            input.hpi,
            input.exam,
            input.diagnosis,
            input.plan,
            input.va_od,
            input.va_os,
            input.iop_od,
            input.iop_os,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_encounter(conn, patient_id, id)?.ok_or_else(|| DatabaseError::not_found("Encounter", id))
}

pub fn get_encounter(
    conn: &Connection,
    patient_id: i64,
    id: i64,
) -> Result<Option<Encounter>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {ENCOUNTER_COLUMNS} FROM encounters WHERE id = ?1 AND patient_id = ?2"),
        params![id, patient_id],
        encounter_from_row,
    )
    .optional()?
    .map(build_encounter)
    .transpose()
}

/// Encounters of one patient, newest first, capped at `ENCOUNTER_LIST_LIMIT`.
/// Fails with `NotFound` when the patient does not exist.
pub fn list_encounters(conn: &Connection, patient_id: i64) -> Result<Vec<Encounter>, DatabaseError> {
    if !patient_exists(conn, patient_id)? {
        return Err(DatabaseError::not_found("Patient", patient_id));
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENCOUNTER_COLUMNS} FROM encounters
         WHERE patient_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT {ENCOUNTER_LIST_LIMIT}"
    ))?;
    let rows = stmt.query_map(params![patient_id], encounter_from_row)?;

    let mut encounters = Vec::new();
    for row in rows {
        encounters.push(build_encounter(row?)?);
    }
    Ok(encounters)
}
