//! Value ↔ declared-column-type compatibility checks.

use crate::error::{Error, Result};
use crate::schema::{DataType, Schema};
use crate::value::Value;

#[derive(Clone, Copy)]
pub struct TypeValidator<'a> {
    schema: &'a Schema,
}

impl<'a> TypeValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    pub fn validate_scalar(&self, table: &str, column: &str, value: &Value) -> Result<()> {
        let expected = self.schema.data_type(table, column)?;
        Self::validate_value(&format!("{table}.{column}"), expected, value)
    }

    pub fn validate_array(&self, table: &str, column: &str, values: &[Value]) -> Result<()> {
        let expected = self.schema.data_type(table, column)?;
        for value in values {
            Self::validate_value(&format!("{table}.{column}"), expected, value)?;
        }
        Ok(())
    }

    pub fn validate_value(context: &str, expected: DataType, value: &Value) -> Result<()> {
        match (expected, value) {
            (_, Value::Null) => Ok(()),
            (DataType::Integer, Value::Integer(_)) => Ok(()),
            (DataType::Real, Value::Real(_)) => Ok(()),
            (DataType::Text, Value::Text(_)) => Ok(()),
            (DataType::DateTime, Value::Text(text)) => {
                Value::parse_iso8601(text).map(|_| ()).map_err(|_| {
                    Error::invalid_argument(format!(
                        "{context}: '{text}' is not a valid ISO-8601 datetime"
                    ))
                })
            }
            _ => Err(Error::invalid_argument(format!(
                "{context}: expected {expected:?}, got {value:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_column_rejects_text() {
        let err =
            TypeValidator::validate_value("t.c", DataType::Integer, &Value::Text("x".into()))
                .unwrap_err();
        assert!(err.to_string().contains("expected Integer"));
    }

    #[test]
    fn null_is_always_accepted() {
        assert!(TypeValidator::validate_value("t.c", DataType::Integer, &Value::Null).is_ok());
    }

    #[test]
    fn datetime_requires_parseable_text() {
        assert!(TypeValidator::validate_value(
            "t.c",
            DataType::DateTime,
            &Value::Text("2024-01-01T00:00:00".into())
        )
        .is_ok());
        assert!(TypeValidator::validate_value(
            "t.c",
            DataType::DateTime,
            &Value::Text("not-a-date".into())
        )
        .is_err());
    }
}
