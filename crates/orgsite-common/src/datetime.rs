//! Canonical timestamp handling
//!
//! Every timestamp that leaves the server (API payloads, audit snapshots) is
//! rendered as ISO-8601 UTC with millisecond precision, e.g.
//! `2024-05-01T18:00:00.000Z`. The serde helpers in [`iso8601`] are meant to
//! be used with `#[serde(with = "...")]` on row models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::{OrgsiteError, Result};

/// Render a timestamp in the canonical ISO-8601 form.
pub fn to_iso8601(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a user-supplied timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T18:00:00Z`), HTML `datetime-local` values
/// (`2024-05-01T18:00`, interpreted as UTC) and plain dates (`2024-05-01`,
/// midnight UTC).
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(OrgsiteError::InvalidTimestamp(input.to_string()))
}

/// Serde adapter for `DateTime<Utc>` fields.
pub mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_iso8601(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "iso8601")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_to_iso8601_uses_millis_and_z() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap();
        assert_eq!(to_iso8601(&at), "2024-05-01T18:00:00.000Z");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T18:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01T20:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01T18:30").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-05-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_serde_adapter() {
        let value = Stamped {
            at: Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap(),
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["at"], "2023-01-02T03:04:05.000Z");

        let back: Stamped = serde_json::from_value(json).unwrap();
        assert_eq!(back.at, value.at);
    }
}
