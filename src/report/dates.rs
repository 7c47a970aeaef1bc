//! Lenient serde adapters for the date fields of an inbound report.
//!
//! Publishers disagree on how they spell a date: some send a bare
//! `YYYY-MM-DD`, .NET serializers send `YYYY-MM-DDTHH:MM:SS` (sometimes with
//! fractional seconds or an offset). Only the wall-clock value is kept.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMAT: &str = "%Y-%m-%d";
const WIRE_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a date-time in any of the accepted wire spellings.
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.naive_local());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Parse a calendar date, accepting a full date-time and dropping the time part.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .or_else(|| parse_date_time(trimmed).map(|date_time| date_time.date()))
}

pub mod date_time {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(super::WIRE_DATE_TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date_time(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date-time '{raw}'")))
    }
}

pub mod optional_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(super::DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse_date(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date '{raw}'"))),
        }
    }
}
