use chrono::{DateTime, Utc};

/// Patients are listed in (last_name, first_name) order, at most this many.
pub const PATIENT_LIST_LIMIT: i64 = 200;

/// Encounters are listed newest first, at most this many.
pub const ENCOUNTER_LIST_LIMIT: i64 = 200;

/// Default length of the appointment window when no end is given.
pub const DEFAULT_APPOINTMENT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Default)]
pub struct PatientFilter {
    /// Case-insensitive substring over first name, last name and national id.
    pub query: Option<String>,
}

/// Appointments fully contained in `[start, end]`.
#[derive(Debug, Clone)]
pub struct AppointmentFilter {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub specialist: Option<String>,
}

impl AppointmentFilter {
    /// Fill in the default window: start = `now`, end = start + 30 days.
    pub fn with_defaults(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        specialist: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let start = start.unwrap_or(now);
        let end = end.unwrap_or(start + chrono::Duration::days(DEFAULT_APPOINTMENT_WINDOW_DAYS));
        Self {
            start,
            end,
            specialist: specialist.filter(|s| !s.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_window_is_thirty_days_from_now() {
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap();
        let f = AppointmentFilter::with_defaults(None, None, None, now);
        assert_eq!(f.start, now);
        assert_eq!(f.end, Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn default_end_follows_explicit_start() {
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap();
        let f = AppointmentFilter::with_defaults(Some(start), None, Some(String::new()), now);
        assert_eq!(f.end, Utc.with_ymd_and_hms(2027, 1, 31, 0, 0, 0).unwrap());
        assert_eq!(f.specialist, None);
    }
}
