//! Stored records: typed metadata plus a fixed-length embedding.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::schema::ColumnType;

/// A typed metadata value.
///
/// Serialized untagged. On the way back in, any string that parses as an
/// RFC 3339 timestamp becomes `Timestamp`, so text shaped like a timestamp
/// does not survive a serde round trip as `Text`. Use [`Value::from_json`]
/// when the column type is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
            Value::Timestamp(_) => "TIMESTAMP",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert a JSON value into a `Value` typed for a column.
    ///
    /// Timestamps accept RFC 3339 strings. Blobs accept arrays of bytes.
    /// Columns of unrecognised type take the JSON value's natural mapping.
    pub fn from_json(
        column: &str,
        column_type: &ColumnType,
        json: &serde_json::Value,
    ) -> Result<Self, FormatError> {
        use serde_json::Value as Json;

        let mismatch = || FormatError::TypeMismatch {
            column: column.to_string(),
            expected: column_type.to_string(),
            actual: json.to_string(),
        };

        if json.is_null() {
            return Ok(Value::Null);
        }

        match column_type {
            ColumnType::Integer => json.as_i64().map(Value::Integer).ok_or_else(mismatch),
            ColumnType::Real => json.as_f64().map(Value::Real).ok_or_else(mismatch),
            ColumnType::Text => json
                .as_str()
                .map(|s| Value::Text(s.to_string()))
                .ok_or_else(mismatch),
            ColumnType::Timestamp => {
                let raw = json.as_str().ok_or_else(mismatch)?;
                parse_timestamp(raw).map(Value::Timestamp)
            }
            ColumnType::Blob => {
                let items = json.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .map(Value::Blob)
                    .ok_or_else(mismatch)
            }
            ColumnType::Other(_) => match json {
                Json::Bool(b) => Ok(Value::Integer(i64::from(*b))),
                Json::Number(n) => Ok(n
                    .as_i64()
                    .map(Value::Integer)
                    .or_else(|| n.as_f64().map(Value::Real))
                    .ok_or_else(mismatch)?),
                Json::String(s) => Ok(Value::Text(s.clone())),
                _ => Err(mismatch()),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Value::Timestamp(ts) => f.write_str(&format_timestamp(ts)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

/// Persisted timestamp form: UTC, fixed microsecond precision, `Z` suffix.
/// Fixed width keeps lexical order equal to chronological order, which the
/// backend relies on when comparing timestamps in a filter.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 and the backend's own `CURRENT_TIMESTAMP` form
/// (`YYYY-MM-DD HH:MM:SS`, implicitly UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, FormatError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|rfc_err| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|_| rfc_err)
        })
        .map_err(|e| FormatError::InvalidTimestamp {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// A record: metadata keyed by column name and its embedding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    pub embedding: Vec<f64>,
}

impl Vector {
    pub fn new(embedding: Vec<f64>) -> Self {
        Self {
            metadata: BTreeMap::new(),
            embedding,
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.metadata.get(column)
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

impl AsRef<[f64]> for Vector {
    fn as_ref(&self) -> &[f64] {
        &self.embedding
    }
}
