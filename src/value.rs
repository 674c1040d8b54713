//! The tagged-union value type that flows through the whole crate.

use crate::error::{Error, Result};
use chrono::NaiveDateTime;

/// Canonical ISO-8601 shape used for all `DateTime` values travelling as text.
const ISO_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// A single attribute value.
///
/// There is no separate `DateTime` variant: a datetime always travels as
/// [`Value::Text`] in canonical ISO-8601 form and is distinguished only by
/// the declared column type or the `date_*` naming rule (see
/// [`crate::schema::DataType`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Parse `text` as an ISO-8601 timestamp in one of the two accepted
    /// shapes, returning the canonical `T`-separated form.
    pub fn parse_iso8601(text: &str) -> Result<NaiveDateTime> {
        for fmt in ISO_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
                return Ok(dt);
            }
        }
        Err(Error::invalid_argument(format!(
            "'{text}' is not a valid ISO-8601 timestamp"
        )))
    }

    pub fn canonical_datetime(text: &str) -> Result<String> {
        Ok(Self::parse_iso8601(text)?
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string())
    }
}

impl From<duckdb::types::Value> for Value {
    fn from(v: duckdb::types::Value) -> Self {
        use duckdb::types::Value as D;
        match v {
            D::Null => Value::Null,
            D::Boolean(b) => Value::Integer(b as i64),
            D::TinyInt(i) => Value::Integer(i as i64),
            D::SmallInt(i) => Value::Integer(i as i64),
            D::Int(i) => Value::Integer(i as i64),
            D::BigInt(i) => Value::Integer(i),
            D::HugeInt(i) => Value::Integer(i as i64),
            D::Float(f) => Value::Real(f as f64),
            D::Double(f) => Value::Real(f),
            D::Text(s) => Value::Text(s),
            other => Value::Text(format!("{other:?}")),
        }
    }
}

impl duckdb::ToSql for Value {
    fn to_sql(&self) -> duckdb::Result<duckdb::types::ToSqlOutput<'_>> {
        use duckdb::types::{ToSqlOutput, Value as D};
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(D::Null),
            Value::Integer(i) => ToSqlOutput::Owned(D::BigInt(*i)),
            Value::Real(f) => ToSqlOutput::Owned(D::Double(*f)),
            Value::Text(s) => ToSqlOutput::Owned(D::Text(s.clone())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_iso_shapes() {
        assert!(Value::parse_iso8601("2024-01-02T03:04:05").is_ok());
        assert!(Value::parse_iso8601("2024-01-02 03:04:05").is_ok());
        assert!(Value::parse_iso8601("not-a-date").is_err());
    }

    #[test]
    fn canonicalizes_to_t_separated() {
        assert_eq!(
            Value::canonical_datetime("2024-01-02 03:04:05").unwrap(),
            "2024-01-02T03:04:05"
        );
    }
}
