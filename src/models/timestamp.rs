//! Timestamp handling shared by the API and the store.
//!
//! Stored as fixed-width UTC text so SQL string comparison matches
//! chronological order. Accepted from clients as RFC 3339 or as a naive
//! date-time interpreted as UTC.

use chrono::{DateTime, Datelike, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use crate::db::DatabaseError;

const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub fn to_storage(ts: &DateTime<Utc>) -> String {
    ts.format(STORAGE_FORMAT).to_string()
}

pub fn from_storage(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    NaiveDateTime::parse_from_str(raw, STORAGE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {raw:?}: {e}")))
}

/// Years that keep the fixed-width storage text in chronological order.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Parse a client-supplied timestamp.
///
/// Truncated to the stored microsecond precision. Years outside
/// `0..=9999` are rejected.
pub fn parse_lenient(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let ts = match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(_) => NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?
            .and_utc(),
    };
    STORABLE_YEARS
        .contains(&ts.year())
        .then(|| ts.trunc_subsecs(6))
}

pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_lenient(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Same rules for `Option<DateTime<Utc>>` fields.
pub mod option {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse_lenient(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn storage_round_trip_keeps_microseconds() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
            + chrono::Duration::microseconds(123_456);
        let stored = to_storage(&ts);
        assert_eq!(stored, "2026-03-01 09:30:00.123456");
        assert_eq!(from_storage(&stored).unwrap(), ts);
    }

    #[test]
    fn storage_text_sorts_chronologically() {
        let early = Utc.with_ymd_and_hms(2026, 1, 9, 23, 59, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        assert!(to_storage(&early) < to_storage(&late));
    }

    #[test]
    fn lenient_parse_accepts_offsets_and_naive() {
        let expected = Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap();
        assert_eq!(parse_lenient("2026-05-04T12:00:00Z"), Some(expected));
        assert_eq!(parse_lenient("2026-05-04T14:00:00+02:00"), Some(expected));
        assert_eq!(parse_lenient("2026-05-04T12:00:00"), Some(expected));
        assert_eq!(parse_lenient("2026-05-04T12:00"), Some(expected));
        assert_eq!(parse_lenient("2026-05-04 12:00:00.000"), Some(expected));
        assert_eq!(parse_lenient("next tuesday"), None);
    }

    #[test]
    fn lenient_parse_truncates_to_microseconds() {
        let parsed = parse_lenient("2030-01-01T10:00:00.123456789Z").unwrap();
        assert_eq!(parsed.timestamp_subsec_nanos(), 123_456_000);
        assert_eq!(from_storage(&to_storage(&parsed)).unwrap(), parsed);
    }

    #[test]
    fn lenient_parse_rejects_years_beyond_four_digits() {
        assert!(parse_lenient("9999-12-31T23:00:00Z").is_some());
        assert_eq!(parse_lenient("+10000-01-01T01:00:00"), None);
        assert_eq!(parse_lenient("+10000-01-01T01:00:00Z"), None);
        assert_eq!(parse_lenient("-0001-01-01T00:00:00Z"), None);
    }

    #[test]
    fn corrupt_storage_value_is_an_error() {
        assert!(from_storage("yesterday").is_err());
    }
}
