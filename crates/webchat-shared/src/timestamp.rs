//! Display-text encoding for message timestamps.
//!
//! Messages keep a structured `DateTime<FixedOffset>` in memory and are
//! rendered as `YYYY-MM-DD HH:MM:SS.fffffffff +ZZZZ` on the wire. Parsing is
//! lenient so older persistence files still restore: RFC 3339 is accepted,
//! and so is any text whose first three whitespace-separated fields are the
//! date, the time and the numeric offset (trailing zone names and monotonic
//! clock readings are ignored).

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::TimestampError;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f %z";
const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Current wall-clock time in the server's local offset.
pub fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

pub fn format(ts: &DateTime<FixedOffset>) -> String {
    ts.format(DISPLAY_FORMAT).to_string()
}

pub fn parse(value: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TimestampError::Empty);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts);
    }

    let leading: Vec<&str> = value.split_whitespace().take(3).collect();
    DateTime::parse_from_str(&leading.join(" "), PARSE_FORMAT).map_err(|source| {
        TimestampError::Unrecognized {
            value: value.to_string(),
            source,
        }
    })
}

pub fn serialize<S>(ts: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(ts))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}
