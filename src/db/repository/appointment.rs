use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{contains_pattern, patient_exists};
use crate::db::DatabaseError;
use crate::models::timestamp;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "id, title, specialist, location, start_at, end_at, status,
    type, channel, notes, patient_id, online";

struct AppointmentRow {
    id: i64,
    title: String,
    specialist: String,
    location: String,
    start_at: String,
    end_at: String,
    status: String,
    appointment_type: String,
    channel: String,
    notes: String,
    patient_id: Option<i64>,
    online: bool,
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        title: row.get(1)?,
        specialist: row.get(2)?,
        location: row.get(3)?,
        start_at: row.get(4)?,
        end_at: row.get(5)?,
        status: row.get(6)?,
        appointment_type: row.get(7)?,
        channel: row.get(8)?,
        notes: row.get(9)?,
        patient_id: row.get(10)?,
        online: row.get(11)?,
    })
}

fn build_appointment(conn: &Connection, row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: row.id,
        title: row.title,
        specialist: row.specialist,
        location: row.location,
        start_at: timestamp::from_storage(&row.start_at)?,
        end_at: timestamp::from_storage(&row.end_at)?,
        status: row.status,
        appointment_type: row.appointment_type,
        channel: row.channel,
        tags: load_tags(conn, row.id)?,
        notes: row.notes,
        patient_id: row.patient_id,
        online: row.online,
    })
}

fn load_tags(conn: &Connection, appointment_id: i64) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare_cached(
        "SELECT tag FROM appointment_tags WHERE appointment_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![appointment_id], |row| row.get::<_, String>(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Replace the tag set of an appointment. `tags` must already be normalized.
fn store_tags(conn: &Connection, appointment_id: i64, tags: &[String]) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM appointment_tags WHERE appointment_id = ?1",
        params![appointment_id],
    )?;
    let mut stmt = conn.prepare_cached(
        "INSERT INTO appointment_tags (appointment_id, position, tag) VALUES (?1, ?2, ?3)",
    )?;
    for (position, tag) in tags.iter().enumerate() {
        stmt.execute(params![appointment_id, position as i64, tag])?;
    }
    Ok(())
}

/// Shared checks for create and update.
fn validate(
    conn: &Connection,
    start_at: &DateTime<Utc>,
    end_at: &DateTime<Utc>,
    patient_id: Option<i64>,
) -> Result<(), DatabaseError> {
    if start_at > end_at {
        return Err(DatabaseError::InvalidInput(
            "start_at must not be after end_at".into(),
        ));
    }
    if let Some(pid) = patient_id {
        if !patient_exists(conn, pid)? {
            return Err(DatabaseError::not_found("Patient", pid));
        }
    }
    Ok(())
}

pub fn insert_appointment(
    conn: &Connection,
    input: &AppointmentCreate,
) -> Result<Appointment, DatabaseError> {
    validate(conn, &input.start_at, &input.end_at, input.patient_id)?;
    let tags = normalize_tags(input.tags.clone());

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO appointments (title, specialist, location, start_at, end_at, status,
                                   type, channel, notes, patient_id, online)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            input.title,
            input.specialist,
            input.location,
            timestamp::to_storage(&input.start_at),
            timestamp::to_storage(&input.end_at),
            input.status,
            input.appointment_type,
            input.channel,
            input.notes,
            input.patient_id,
            input.online,
        ],
    )?;
    let id = tx.last_insert_rowid();
    store_tags(&tx, id, &tags)?;
    tx.commit()?;

    Ok(Appointment {
        id,
        title: input.title.clone(),
        specialist: input.specialist.clone(),
        location: input.location.clone(),
        start_at: input.start_at,
        end_at: input.end_at,
        status: input.status.clone(),
        appointment_type: input.appointment_type.clone(),
        channel: input.channel.clone(),
        tags,
        notes: input.notes.clone(),
        patient_id: input.patient_id,
        online: input.online,
    })
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id],
            appointment_from_row,
        )
        .optional()?;
    row.map(|r| build_appointment(conn, r)).transpose()
}

/// Appointments fully inside the filter window, earliest first. Not capped.
pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<Appointment>, DatabaseError> {
    let start = timestamp::to_storage(&filter.start);
    let end = timestamp::to_storage(&filter.end);

    let mut sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE start_at >= ?1 AND end_at <= ?2"
    );
    if filter.specialist.is_some() {
        sql.push_str(" AND specialist LIKE ?3 ESCAPE '\\'");
    }
    sql.push_str(" ORDER BY start_at ASC, id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = match &filter.specialist {
        Some(s) => stmt.query_map(params![start, end, contains_pattern(s)], appointment_from_row)?,
        None => stmt.query_map(params![start, end], appointment_from_row)?,
    };

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(build_appointment(conn, row?)?);
    }
    Ok(appointments)
}

/// Applies the present fields of `update` and re-checks the merged record.
pub fn update_appointment(
    conn: &Connection,
    id: i64,
    update: AppointmentUpdate,
) -> Result<Appointment, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let mut appt =
        get_appointment(&tx, id)?.ok_or_else(|| DatabaseError::not_found("Appointment", id))?;
    if update.is_empty() {
        return Ok(appt);
    }
    let tags_changed = update.tags.is_some();
    update.apply_to(&mut appt);
    validate(&tx, &appt.start_at, &appt.end_at, appt.patient_id)?;

    tx.execute(
        "UPDATE appointments SET title = ?1, specialist = ?2, location = ?3, start_at = ?4,
                end_at = ?5, status = ?6, type = ?7, channel = ?8, notes = ?9,
                patient_id = ?10, online = ?11
         WHERE id = ?12",
        params![
            appt.title,
            appt.specialist,
            appt.location,
            timestamp::to_storage(&appt.start_at),
            timestamp::to_storage(&appt.end_at),
            appt.status,
            appt.appointment_type,
            appt.channel,
            appt.notes,
            appt.patient_id,
            appt.online,
            id,
        ],
    )?;
    if tags_changed {
        store_tags(&tx, id, &appt.tags)?;
    }
    tx.commit()?;
    Ok(appt)
}

/// Deletes the appointment and its tags. A linked patient is untouched.
pub fn delete_appointment(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::db::{delete_patient, get_patient, insert_patient};
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn input(title: &str, start: DateTime<Utc>, specialist: &str) -> AppointmentCreate {
        AppointmentCreate {
            title: title.into(),
            specialist: specialist.into(),
            location: "Room 1".into(),
            start_at: start,
            end_at: start + chrono::Duration::minutes(30),
            status: "scheduled".into(),
            appointment_type: "consult".into(),
            channel: "front-desk".into(),
            tags: vec![],
            notes: String::new(),
            patient_id: None,
            online: false,
        }
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> AppointmentFilter {
        AppointmentFilter { start, end, specialist: None }
    }

    fn patient(conn: &Connection) -> i64 {
        insert_patient(
            conn,
            &PatientCreate {
                national_id: String::new(),
                first_name: "Ana".into(),
                last_name: "Diaz".into(),
                birth_date: None,
                phone: String::new(),
                notes: String::new(),
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn tags_round_trip_in_order() {
        let conn = open_memory_database().unwrap();
        let mut req = input("Control", at(2, 9), "Dr. Rivas");
        req.tags = vec!["a".into(), "b".into(), "c".into()];
        let created = insert_appointment(&conn, &req).unwrap();
        let stored = get_appointment(&conn, created.id).unwrap().unwrap();
        assert_eq!(stored.tags, vec!["a", "b", "c"]);
        assert_eq!(stored, created);
    }

    #[test]
    fn tags_may_contain_commas() {
        let conn = open_memory_database().unwrap();
        let mut req = input("Control", at(2, 9), "Dr. Rivas");
        req.tags = vec!["OD, OS".into(), "urgent".into()];
        let created = insert_appointment(&conn, &req).unwrap();
        let stored = get_appointment(&conn, created.id).unwrap().unwrap();
        assert_eq!(stored.tags, vec!["OD, OS", "urgent"]);
    }

    #[test]
    fn window_requires_full_containment() {
        let conn = open_memory_database().unwrap();
        insert_appointment(&conn, &input("inside", at(5, 10), "A")).unwrap();
        insert_appointment(&conn, &input("starts-before", at(1, 10), "A")).unwrap();
        // ends 30 minutes after the window end
        insert_appointment(&conn, &input("ends-after", at(9, 23) + chrono::Duration::minutes(45), "A")).unwrap();

        let found = list_appointments(&conn, &window(at(2, 0), at(10, 0))).unwrap();
        let titles: Vec<&str> = found.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["inside"]);
    }

    #[test]
    fn list_ordered_by_start() {
        let conn = open_memory_database().unwrap();
        insert_appointment(&conn, &input("late", at(7, 15), "A")).unwrap();
        insert_appointment(&conn, &input("early", at(3, 8), "A")).unwrap();
        insert_appointment(&conn, &input("mid", at(5, 12), "A")).unwrap();

        let titles: Vec<String> = list_appointments(&conn, &window(at(1, 0), at(20, 0)))
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["early", "mid", "late"]);
    }

    #[test]
    fn specialist_filter_case_insensitive() {
        let conn = open_memory_database().unwrap();
        insert_appointment(&conn, &input("one", at(3, 8), "Dr. Rivas")).unwrap();
        insert_appointment(&conn, &input("two", at(3, 9), "Dra. Molina")).unwrap();

        let filter = AppointmentFilter {
            specialist: Some("RIVAS".into()),
            ..window(at(1, 0), at(20, 0))
        };
        let found = list_appointments(&conn, &filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "one");
    }

    #[test]
    fn start_after_end_rejected() {
        let conn = open_memory_database().unwrap();
        let mut req = input("bad", at(3, 8), "A");
        req.end_at = at(3, 7);
        let err = insert_appointment(&conn, &req).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidInput(_)));
    }

    #[test]
    fn update_checks_merged_window() {
        let conn = open_memory_database().unwrap();
        let created = insert_appointment(&conn, &input("a", at(3, 8), "A")).unwrap();
        let err = update_appointment(
            &conn,
            created.id,
            AppointmentUpdate {
                start_at: Some(at(3, 12)),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidInput(_)));
        assert_eq!(get_appointment(&conn, created.id).unwrap().unwrap(), created);
    }

    #[test]
    fn update_replaces_tags_only_when_present() {
        let conn = open_memory_database().unwrap();
        let mut req = input("a", at(3, 8), "A");
        req.tags = vec!["x".into()];
        let created = insert_appointment(&conn, &req).unwrap();

        let renamed = update_appointment(
            &conn,
            created.id,
            AppointmentUpdate {
                title: Some("renamed".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(renamed.tags, vec!["x"]);

        let retagged = update_appointment(
            &conn,
            created.id,
            AppointmentUpdate {
                tags: Some(vec!["y".into(), "z".into()]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(retagged.title, "renamed");
        assert_eq!(get_appointment(&conn, created.id).unwrap().unwrap().tags, vec!["y", "z"]);
    }

    #[test]
    fn empty_update_is_identity() {
        let conn = open_memory_database().unwrap();
        let created = insert_appointment(&conn, &input("a", at(3, 8), "A")).unwrap();
        let same = update_appointment(&conn, created.id, AppointmentUpdate::default()).unwrap();
        assert_eq!(same, created);
    }

    #[test]
    fn unknown_patient_rejected() {
        let conn = open_memory_database().unwrap();
        let mut req = input("a", at(3, 8), "A");
        req.patient_id = Some(999);
        let err = insert_appointment(&conn, &req).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { ref entity_type, .. } if entity_type == "Patient"));
    }

    #[test]
    fn deleting_appointment_keeps_patient() {
        let conn = open_memory_database().unwrap();
        let pid = patient(&conn);
        let mut req = input("a", at(3, 8), "A");
        req.patient_id = Some(pid);
        req.tags = vec!["t".into()];
        let created = insert_appointment(&conn, &req).unwrap();

        delete_appointment(&conn, created.id).unwrap();

        assert!(get_patient(&conn, pid).unwrap().is_some());
        assert!(get_appointment(&conn, created.id).unwrap().is_none());
        let tags: i64 = conn
            .query_row("SELECT COUNT(*) FROM appointment_tags", [], |row| row.get(0))
            .unwrap();
        assert_eq!(tags, 0);
    }

    #[test]
    fn deleting_patient_unlinks_appointment() {
        let conn = open_memory_database().unwrap();
        let pid = patient(&conn);
        let mut req = input("a", at(3, 8), "A");
        req.patient_id = Some(pid);
        let created = insert_appointment(&conn, &req).unwrap();

        delete_patient(&conn, pid).unwrap();

        let stored = get_appointment(&conn, created.id).unwrap().unwrap();
        assert_eq!(stored.patient_id, None);
    }

    #[test]
    fn delete_missing_appointment_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            delete_appointment(&conn, 1).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }
}
