//! Server timestamp codec.
//!
//! The API returns UTC timestamps with a one-character zone designator
//! (`2022-06-14T20:15:33.016Z`). The designator is dropped and the rest is
//! read as a naive UTC date-time.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Parse a server timestamp.
pub fn parse(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let mut chars = value.chars();
    chars.next_back();
    let naive: NaiveDateTime = chars.as_str().parse()?;
    Ok(naive.and_utc())
}

/// Format a timestamp the way the server does.
pub fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(value))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}
