use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

const USER_COLUMNS: &str = "id, email, full_name, role, password_hash, is_active";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, String, String, bool)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn build_user(
    (id, email, full_name, role, password_hash, is_active): (i64, String, String, String, String, bool),
) -> Result<User, DatabaseError> {
    Ok(User {
        id,
        email,
        full_name,
        role: Role::from_str(&role)?,
        password_hash,
        is_active,
    })
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_from_row,
        )
        .optional()?;
    raw.map(build_user).transpose()
}

/// Insert a user. Fails with `ConstraintViolation` when the email is taken.
pub fn insert_user(conn: &Connection, user: &NewUser) -> Result<User, DatabaseError> {
    if get_user_by_email(conn, &user.email)?.is_some() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "user {} already exists",
            user.email
        )));
    }
    conn.execute(
        "INSERT INTO users (email, full_name, role, password_hash, is_active)
         VALUES (?1, ?2, ?3, ?4, 1)",
        params![user.email, user.full_name, user.role.as_str(), user.password_hash],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        role: user.role,
        password_hash: user.password_hash.clone(),
        is_active: true,
    })
}

pub fn set_user_active(conn: &Connection, email: &str, active: bool) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET is_active = ?1 WHERE email = ?2",
        params![active, email],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: email.into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            full_name: "Dr. Vega".into(),
            role: Role::Doctor,
            password_hash: "$argon2id$fake".into(),
        }
    }

    #[test]
    fn insert_and_fetch_user() {
        let conn = open_memory_database().unwrap();
        let created = insert_user(&conn, &new_user("vega@clinic.test")).unwrap();
        let fetched = get_user_by_email(&conn, "vega@clinic.test").unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.role, Role::Doctor);
        assert!(fetched.is_active);
    }

    #[test]
    fn duplicate_email_rejected() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &new_user("a@clinic.test")).unwrap();
        let err = insert_user(&conn, &new_user("a@clinic.test")).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn missing_user_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_user_by_email(&conn, "ghost@clinic.test").unwrap().is_none());
    }

    #[test]
    fn deactivate_user() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &new_user("b@clinic.test")).unwrap();
        set_user_active(&conn, "b@clinic.test", false).unwrap();
        let user = get_user_by_email(&conn, "b@clinic.test").unwrap().unwrap();
        assert!(!user.is_active);
    }

    #[test]
    fn deactivate_unknown_user_not_found() {
        let conn = open_memory_database().unwrap();
        let err = set_user_active(&conn, "ghost@clinic.test", false).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
