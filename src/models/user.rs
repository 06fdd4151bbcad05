use serde::Serialize;

use super::enums::Role;

/// Staff account. Only the provisioning commands create or change these.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub password_hash: String,
    pub is_active: bool,
}

/// Public view of a user, without the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserOut {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
}

impl From<&User> for UserOut {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub password_hash: String,
}
