use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::deserialize_some;
use super::timestamp;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Appointment {
    pub id: i64,
    pub title: String,
    pub specialist: String,
    pub location: String,
    #[serde(serialize_with = "timestamp::serialize")]
    pub start_at: DateTime<Utc>,
    #[serde(serialize_with = "timestamp::serialize")]
    pub end_at: DateTime<Utc>,
    pub status: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub channel: String,
    pub tags: Vec<String>,
    pub notes: String,
    pub patient_id: Option<i64>,
    pub online: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentCreate {
    pub title: String,
    pub specialist: String,
    pub location: String,
    #[serde(with = "timestamp")]
    pub start_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "type")]
    pub appointment_type: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub online: bool,
}

/// Partial update. Only fields present in the body are applied;
/// `patient_id: null` unlinks the patient.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub specialist: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub appointment_type: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub patient_id: Option<Option<i64>>,
    #[serde(default)]
    pub online: Option<bool>,
}

impl AppointmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.specialist.is_none()
            && self.location.is_none()
            && self.start_at.is_none()
            && self.end_at.is_none()
            && self.status.is_none()
            && self.appointment_type.is_none()
            && self.channel.is_none()
            && self.tags.is_none()
            && self.notes.is_none()
            && self.patient_id.is_none()
            && self.online.is_none()
    }

    pub fn apply_to(self, appt: &mut Appointment) {
        if let Some(v) = self.title {
            appt.title = v;
        }
        if let Some(v) = self.specialist {
            appt.specialist = v;
        }
        if let Some(v) = self.location {
            appt.location = v;
        }
        if let Some(v) = self.start_at {
            appt.start_at = v;
        }
        if let Some(v) = self.end_at {
            appt.end_at = v;
        }
        if let Some(v) = self.status {
            appt.status = v;
        }
        if let Some(v) = self.appointment_type {
            appt.appointment_type = v;
        }
        if let Some(v) = self.channel {
            appt.channel = v;
        }
        if let Some(v) = self.tags {
            appt.tags = normalize_tags(v);
        }
        if let Some(v) = self.notes {
            appt.notes = v;
        }
        if let Some(v) = self.patient_id {
            appt.patient_id = v;
        }
        if let Some(v) = self.online {
            appt.online = v;
        }
    }
}

/// Ordered-set semantics: keep first occurrence, drop empty strings.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
