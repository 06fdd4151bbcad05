use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clinical visit note. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encounter {
    pub id: i64,
    pub patient_id: i64,
    #[serde(serialize_with = "super::timestamp::serialize")]
    pub created_at: DateTime<Utc>,
    pub chief_complaint: String,
    pub hpi: String,
    pub exam: String,
    pub diagnosis: String,
    pub plan: String,
    /// Visual acuity, right / left eye
    pub va_od: String,
    pub va_os: String,
    /// Intraocular pressure, right / left eye
    pub iop_od: String,
    pub iop_os: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EncounterCreate {
    pub chief_complaint: String,
    pub hpi: String,
    pub exam: String,
    pub diagnosis: String,
    pub plan: String,
    pub va_od: String,
    pub va_os: String,
    pub iop_od: String,
    pub iop_os: String,
}
