// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Primitive value contracts shared by every entity.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys of a dynamic object which are not part of an entity's schema, in
/// the order they appeared.
pub type Extensions = IndexMap<String, Value>;

/// The kind of value a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A string.
    String,

    /// A list of strings.
    StringSeq,

    /// Either a single string or a list of strings.
    StringOrSeq,

    /// An object with string values.
    StringMap,

    /// A boolean.
    Bool,

    /// A signed integer.
    Integer,

    /// A non-negative integer, used for durations.
    Duration,

    /// A point in time, either as Unix seconds or as a date string.
    Timestamp,

    /// An opaque object.
    Object,

    /// A nested entity.
    Entity(&'static str),

    /// One of a closed set of strings.
    Enum(&'static [&'static str]),

    /// A callable, which a dynamic object can never hold.
    Callback,

    /// Anything.
    Any,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::StringSeq => f.write_str("list of strings"),
            Self::StringOrSeq => f.write_str("string or list of strings"),
            Self::StringMap => f.write_str("map of strings"),
            Self::Bool => f.write_str("boolean"),
            Self::Integer => f.write_str("integer"),
            Self::Duration => f.write_str("non-negative integer"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Object => f.write_str("object"),
            Self::Entity(name) => write!(f, "{name} object"),
            Self::Enum(values) => write!(f, "one of {values:?}"),
            Self::Callback => f.write_str("function"),
            Self::Any => f.write_str("value"),
        }
    }
}

/// How well a value matches a [`ValueKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Conformance {
    Valid,
    WrongType,
    Negative,
    UnknownVariant {
        value: String,
        expected: &'static [&'static str],
    },
}

impl ValueKind {
    /// Describe the JSON type of a value, for error messages.
    #[must_use]
    pub fn describe(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Integral floating point numbers are accepted where integers are
    /// expected, since dynamic sources do not distinguish them.
    pub(crate) fn normalize(self, value: Value) -> Value {
        match (self, &value) {
            (Self::Integer | Self::Duration | Self::Timestamp, Value::Number(number))
                if !number.is_i64() && !number.is_u64() =>
            {
                match number.as_f64() {
                    #[allow(clippy::cast_possible_truncation)]
                    Some(float)
                        if float.fract() == 0.0
                            && float >= i64::MIN as f64
                            && float < i64::MAX as f64 =>
                    {
                        Value::from(float as i64)
                    }
                    _ => value,
                }
            }
            _ => value,
        }
    }

    pub(crate) fn conformance(self, value: &Value) -> Conformance {
        let valid = match self {
            Self::String => value.is_string(),
            Self::StringSeq => is_string_seq(value),
            Self::StringOrSeq => value.is_string() || is_string_seq(value),
            Self::StringMap => value
                .as_object()
                .is_some_and(|map| map.values().all(Value::is_string)),
            Self::Bool => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Duration => {
                if value.is_u64() {
                    true
                } else if value.as_i64().is_some_and(i64::is_negative) {
                    return Conformance::Negative;
                } else {
                    false
                }
            }
            Self::Timestamp => Timestamp::parse(value).is_some(),
            Self::Object | Self::Entity(_) => value.is_object(),
            Self::Enum(variants) => match value.as_str() {
                Some(s) if variants.contains(&s) => true,
                Some(s) => {
                    return Conformance::UnknownVariant {
                        value: s.to_owned(),
                        expected: variants,
                    };
                }
                None => false,
            },
            Self::Callback => false,
            Self::Any => true,
        };

        if valid {
            Conformance::Valid
        } else {
            Conformance::WrongType
        }
    }

    pub(crate) fn is_empty(value: &Value) -> bool {
        match value {
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            _ => false,
        }
    }
}

fn is_string_seq(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_string))
}

/// The shape a [`Timestamp`] arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampFormat {
    /// A number of seconds since the Unix epoch
    UnixSeconds,

    /// An RFC 3339 string, like `2018-09-18T00:37:28.000Z`
    Rfc3339,

    /// The string produced by a JavaScript `Date`
    JavaScriptDate,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Repr {
    UnixSeconds,
    Rfc3339(String),
    JavaScriptDate(String),
}

/// A point in time, written back in the shape it was read in.
///
/// Dynamic objects carry timestamps in several shapes: Unix seconds, RFC 3339
/// strings, or the string produced by a JavaScript `Date`, like
/// `Thu Aug 06 2020 10:35:12 GMT+1000 (Australian Eastern Standard Time)`.
///
/// Two timestamps for the same instant in different shapes are not equal.
/// Compare [`Timestamp::as_datetime`] to compare instants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    instant: DateTime<Utc>,
    repr: Repr,
}

impl Timestamp {
    /// Parse a timestamp out of any of the accepted shapes.
    #[must_use]
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => Self::from_unix_seconds(number.as_i64()?),
            Value::String(s) => Self::parse_str(s),
            _ => None,
        }
    }

    /// Parse a timestamp out of an RFC 3339 or JavaScript `Date` string.
    #[must_use]
    pub fn parse_str(s: &str) -> Option<Self> {
        if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
            return Some(Self {
                instant: datetime.with_timezone(&Utc),
                repr: Repr::Rfc3339(s.to_owned()),
            });
        }

        // Drop the trailing timezone name, like `(Central European Summer Time)`
        let date = s.split_once(" (").map_or(s, |(date, _)| date).trim();
        let datetime = DateTime::parse_from_str(date, "%a %b %d %Y %H:%M:%S GMT%z").ok()?;
        Some(Self {
            instant: datetime.with_timezone(&Utc),
            repr: Repr::JavaScriptDate(s.to_owned()),
        })
    }

    /// A timestamp from a number of seconds since the Unix epoch.
    #[must_use]
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(|instant| Self {
            instant,
            repr: Repr::UnixSeconds,
        })
    }

    /// The number of seconds since the Unix epoch.
    #[must_use]
    pub fn unix_seconds(&self) -> i64 {
        self.instant.timestamp()
    }

    /// The underlying date and time.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.instant
    }

    /// The shape this timestamp is written in.
    #[must_use]
    pub fn format(&self) -> TimestampFormat {
        match self.repr {
            Repr::UnixSeconds => TimestampFormat::UnixSeconds,
            Repr::Rfc3339(_) => TimestampFormat::Rfc3339,
            Repr::JavaScriptDate(_) => TimestampFormat::JavaScriptDate,
        }
    }

    /// The string this timestamp was read from, if it was a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.repr {
            Repr::UnixSeconds => None,
            Repr::Rfc3339(s) | Repr::JavaScriptDate(s) => Some(s),
        }
    }
}

/// Written as an RFC 3339 string.
impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        let repr = Repr::Rfc3339(instant.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        Self { instant, repr }
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(value: Timestamp) -> Self {
        value.instant
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match &self.repr {
            Repr::UnixSeconds => serializer.serialize_i64(self.unix_seconds()),
            Repr::Rfc3339(s) | Repr::JavaScriptDate(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let value = ValueKind::Timestamp.normalize(value);
        Self::parse(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid timestamp, found {}",
                ValueKind::describe(&value)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_javascript_date_string() {
        let timestamp = Timestamp::parse(&json!(
            "Thu Aug 06 2020 10:35:12 GMT+1000 (Australian Eastern Standard Time)"
        ))
        .unwrap();

        assert_eq!(
            timestamp.as_datetime(),
            &Utc.with_ymd_and_hms(2020, 8, 6, 0, 35, 12).unwrap()
        );
        assert_eq!(timestamp.format(), TimestampFormat::JavaScriptDate);
    }

    #[test]
    fn written_back_in_the_shape_read() {
        for (value, format) in [
            (json!(1_596_674_112), TimestampFormat::UnixSeconds),
            (json!("2020-08-06T00:35:12.000Z"), TimestampFormat::Rfc3339),
            (json!("2020-08-06T10:35:12+10:00"), TimestampFormat::Rfc3339),
            (
                json!("Thu Aug 06 2020 10:35:12 GMT+1000 (Australian Eastern Standard Time)"),
                TimestampFormat::JavaScriptDate,
            ),
        ] {
            let timestamp: Timestamp = serde_json::from_value(value.clone()).unwrap();
            assert_eq!(timestamp.format(), format);
            assert_eq!(timestamp.unix_seconds(), 1_596_674_112);
            assert_eq!(serde_json::to_value(&timestamp).unwrap(), value);

            let again: Timestamp = serde_json::from_value(value).unwrap();
            assert_eq!(again, timestamp);
        }
    }

    #[test]
    fn shapes_are_distinct() {
        let seconds = Timestamp::from_unix_seconds(1_596_674_112).unwrap();
        let string = Timestamp::parse_str("2020-08-06T00:35:12Z").unwrap();

        assert_ne!(seconds, string);
        assert_eq!(seconds.as_datetime(), string.as_datetime());
        assert_eq!(seconds.as_str(), None);
        assert_eq!(string.as_str(), Some("2020-08-06T00:35:12Z"));

        let from_datetime = Timestamp::from(*seconds.as_datetime());
        assert_eq!(from_datetime, string);
    }

    #[test]
    fn parse_other_shapes() {
        let expected = Utc.with_ymd_and_hms(2018, 9, 18, 0, 37, 28).unwrap();

        let timestamp = Timestamp::parse(&json!(1_537_231_048)).unwrap();
        assert_eq!(timestamp.as_datetime(), &expected);
        assert_eq!(timestamp.unix_seconds(), 1_537_231_048);

        let timestamp = Timestamp::parse(&json!("2018-09-18T00:37:28.000Z")).unwrap();
        assert_eq!(timestamp.as_datetime(), &expected);

        assert!(Timestamp::parse(&json!("yesterday")).is_none());
        assert!(Timestamp::parse(&json!(true)).is_none());
    }

    #[test]
    fn integral_floats_are_integers() {
        let value = ValueKind::Integer.normalize(json!(42.0));
        assert!(value.is_i64());
        assert_eq!(ValueKind::Integer.conformance(&value), Conformance::Valid);

        let value = ValueKind::Integer.normalize(json!(42.5));
        assert_eq!(ValueKind::Integer.conformance(&value), Conformance::WrongType);

        // Strings are left alone
        let value = ValueKind::String.normalize(json!(42.0));
        assert!(value.is_f64());
    }

    #[test]
    fn floats_out_of_integer_range_stay_floats() {
        // 2^63 is one past `i64::MAX`, and rounds to the same float
        let value = ValueKind::Integer.normalize(json!(9_223_372_036_854_775_808.0_f64));
        assert!(value.is_f64());
        assert_eq!(ValueKind::Integer.conformance(&value), Conformance::WrongType);

        let value = ValueKind::Integer.normalize(json!(-9_223_372_036_854_775_808.0_f64));
        assert_eq!(value, json!(i64::MIN));
    }

    #[test]
    fn conformance() {
        assert_eq!(
            ValueKind::Duration.conformance(&json!(-1)),
            Conformance::Negative
        );
        assert_eq!(
            ValueKind::Duration.conformance(&json!(6000)),
            Conformance::Valid
        );
        assert_eq!(
            ValueKind::Enum(&["query", "fragment"]).conformance(&json!("post")),
            Conformance::UnknownVariant {
                value: "post".to_owned(),
                expected: &["query", "fragment"],
            }
        );
        assert_eq!(
            ValueKind::Enum(&["query", "fragment"]).conformance(&json!(1)),
            Conformance::WrongType
        );
        assert_eq!(
            ValueKind::StringOrSeq.conformance(&json!(["a", "b"])),
            Conformance::Valid
        );
        assert_eq!(
            ValueKind::StringSeq.conformance(&json!(["a", 1])),
            Conformance::WrongType
        );
        assert_eq!(
            ValueKind::Callback.conformance(&json!({})),
            Conformance::WrongType
        );
    }
}
