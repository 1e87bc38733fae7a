//! Serde helper functions for DynamoDB timestamps.
//!
//! The DynamoDB JSON protocol encodes timestamps as fractional epoch seconds,
//! so `CreationDateTime` goes over the wire as `1700000000.123` rather than an
//! RFC 3339 string.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

fn to_epoch_seconds(value: &DateTime<Utc>) -> f64 {
    value.timestamp_millis() as f64 / 1000.0
}

fn from_epoch_seconds<E: serde::de::Error>(seconds: f64) -> Result<DateTime<Utc>, E> {
    Utc.timestamp_millis_opt((seconds * 1000.0).round() as i64)
        .single()
        .ok_or_else(|| E::custom(format!("timestamp out of range: {}", seconds)))
}

/// Serialize a timestamp as epoch seconds.
pub fn serialize_epoch_seconds<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(to_epoch_seconds(value))
}

/// Deserialize a timestamp from epoch seconds.
pub fn deserialize_epoch_seconds<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    from_epoch_seconds(seconds)
}

/// Serialize an optional timestamp as epoch seconds.
/// Pair with `skip_serializing_if = "Option::is_none"`.
pub fn serialize_optional_epoch_seconds<S>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(value) => serializer.serialize_f64(to_epoch_seconds(value)),
        None => serializer.serialize_none(),
    }
}

/// Deserialize an optional timestamp from epoch seconds.
pub fn deserialize_optional_epoch_seconds<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds: Option<f64> = Option::deserialize(deserializer)?;
    seconds.map(from_epoch_seconds).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestStruct {
        #[serde(
            serialize_with = "serialize_epoch_seconds",
            deserialize_with = "deserialize_epoch_seconds"
        )]
        at: DateTime<Utc>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            serialize_with = "serialize_optional_epoch_seconds",
            deserialize_with = "deserialize_optional_epoch_seconds"
        )]
        maybe: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_serialize_as_fractional_seconds() {
        let value = TestStruct {
            at: Utc.timestamp_millis_opt(1_700_000_000_250).unwrap(),
            maybe: None,
        };
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"at":1700000000.25}"#);
    }

    #[test]
    fn test_deserialize_integer_seconds() {
        let json = r#"{"at": 1700000000, "maybe": 1700000001.5}"#;
        let value: TestStruct = serde_json::from_str(json).unwrap();
        assert_eq!(value.at.timestamp(), 1_700_000_000);
        assert_eq!(value.maybe.unwrap().timestamp_millis(), 1_700_000_001_500);
    }

    #[test]
    fn test_deserialize_missing_optional() {
        let json = r#"{"at": 0}"#;
        let value: TestStruct = serde_json::from_str(json).unwrap();
        assert_eq!(value.maybe, None);
    }
}
