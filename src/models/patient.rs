use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::deserialize_some;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientCreate {
    #[serde(default)]
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub notes: String,
}

/// Partial update. Only fields present in the body are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PatientUpdate {
    pub fn is_empty(&self) -> bool {
        self.national_id.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.birth_date.is_none()
            && self.phone.is_none()
            && self.notes.is_none()
    }

    /// Apply the present fields onto `patient`.
    pub fn apply_to(self, patient: &mut Patient) {
        if let Some(v) = self.national_id {
            patient.national_id = v;
        }
        if let Some(v) = self.first_name {
            patient.first_name = v;
        }
        if let Some(v) = self.last_name {
            patient.last_name = v;
        }
        if let Some(v) = self.birth_date {
            patient.birth_date = v;
        }
        if let Some(v) = self.phone {
            patient.phone = v;
        }
        if let Some(v) = self.notes {
            patient.notes = v;
        }
    }
}
