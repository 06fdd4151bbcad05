use rusqlite::{params, Connection, OptionalExtension, Row};

use super::contains_pattern;
use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, national_id, first_name, last_name, birth_date, phone, notes";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        national_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        birth_date: row.get(4)?,
        phone: row.get(5)?,
        notes: row.get(6)?,
    })
}

pub fn insert_patient(conn: &Connection, input: &PatientCreate) -> Result<Patient, DatabaseError> {
    validate_names(&input.first_name, &input.last_name)?;
    conn.execute(
        "INSERT INTO patients (national_id, first_name, last_name, birth_date, phone, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            input.national_id,
            input.first_name,
            input.last_name,
            input.birth_date,
            input.phone,
            input.notes,
        ],
    )?;
    Ok(Patient {
        id: conn.last_insert_rowid(),
        national_id: input.national_id.clone(),
        first_name: input.first_name.clone(),
        last_name: input.last_name.clone(),
        birth_date: input.birth_date,
        phone: input.phone.clone(),
        notes: input.notes.clone(),
    })
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
        params![id],
        patient_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn patient_exists(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM patients WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Lists patients ordered by last name, first name; capped at
/// `PATIENT_LIST_LIMIT`.
pub fn list_patients(conn: &Connection, filter: &PatientFilter) -> Result<Vec<Patient>, DatabaseError> {
    let query = filter.query.as_deref().filter(|q| !q.is_empty());

    let mut sql = format!("SELECT {PATIENT_COLUMNS} FROM patients");
    if query.is_some() {
        sql.push_str(
            " WHERE first_name LIKE ?1 ESCAPE '\\'
                 OR last_name LIKE ?1 ESCAPE '\\'
                 OR national_id LIKE ?1 ESCAPE '\\'",
        );
    }
    sql.push_str(&format!(
        " ORDER BY last_name ASC, first_name ASC, id ASC LIMIT {PATIENT_LIST_LIMIT}"
    ));

    let mut stmt = conn.prepare(&sql)?;
    let rows = match query {
        Some(q) => stmt.query_map(params![contains_pattern(q)], patient_from_row)?,
        None => stmt.query_map([], patient_from_row)?,
    };
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Applies the present fields of `update`. An empty update returns the
/// stored record without writing.
pub fn update_patient(
    conn: &Connection,
    id: i64,
    update: PatientUpdate,
) -> Result<Patient, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let mut patient = get_patient(&tx, id)?.ok_or_else(|| DatabaseError::not_found("Patient", id))?;
    if update.is_empty() {
        return Ok(patient);
    }
    update.apply_to(&mut patient);
    validate_names(&patient.first_name, &patient.last_name)?;

    tx.execute(
        "UPDATE patients SET national_id = ?1, first_name = ?2, last_name = ?3,
                birth_date = ?4, phone = ?5, notes = ?6
         WHERE id = ?7",
        params![
            patient.national_id,
            patient.first_name,
            patient.last_name,
            patient.birth_date,
            patient.phone,
            patient.notes,
            id,
        ],
    )?;
    tx.commit()?;
    Ok(patient)
}

/// Deletes the patient. Encounters cascade; linked appointments are kept
/// with `patient_id` cleared.
pub fn delete_patient(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    Ok(())
}

fn validate_names(first_name: &str, last_name: &str) -> Result<(), DatabaseError> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(DatabaseError::InvalidInput(
            "first_name and last_name must not be empty".into(),
        ));
    }
    Ok(())
}
