//! ISO-8601 handling shared by the SQLite row mappers and the backup codec.
//!
//! Everything date-bearing is persisted as text. Reading a row or decoding a
//! backup turns that text back into `DateTime<Utc>`; a value that does not
//! parse is an error, never a silent default.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

use crate::db::DatabaseError;

/// Render an instant the way `Date.prototype.toISOString` does
/// (`2025-03-10T09:00:00.000Z`). Fixed width, so text order is time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 instant. Offset-less values are taken as UTC.
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    Err(DatabaseError::InvalidDate {
        field: field.into(),
        value: value.into(),
    })
}

/// Parse a date-bearing field that may hold a full instant or a bare
/// `YYYY-MM-DD`. A bare day is midnight UTC, as `new Date("YYYY-MM-DD")`
/// reads it.
pub fn parse_day_or_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(midnight_utc(date));
    }
    parse_timestamp(field, trimmed)
}

pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub fn parse_optional_timestamp(
    field: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    value.map(|v| parse_timestamp(field, &v)).transpose()
}

/// serde adapter for required instants.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp("timestamp", &raw).map_err(serde::de::Error::custom)
    }
}

/// serde adapter for optional instants; `null` and absent both map to `None`.
pub mod optional_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_str(&super::format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        super::parse_optional_timestamp("timestamp", raw).map_err(serde::de::Error::custom)
    }
}

/// serde adapter for instants that older backups may omit; missing or `null`
/// becomes the decoding instant.
pub mod timestamp_or_now {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        super::timestamp::serialize(ts, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => {
                super::parse_timestamp("timestamp", &raw).map_err(serde::de::Error::custom)
            }
            None => Ok(Utc::now()),
        }
    }
}

/// serde adapter for a birth date kept as the full instant it was written
/// with; missing or `null` becomes the decoding instant.
pub mod day_or_now {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        super::timestamp::serialize(ts, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => {
                super::parse_day_or_timestamp("date", &raw).map_err(serde::de::Error::custom)
            }
            None => Ok(Utc::now()),
        }
    }
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
