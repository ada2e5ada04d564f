use crate::stmt::Value;

use chrono::{NaiveDate, NaiveDateTime};

/// Storage-level type of a column attribute.
///
/// The type tag drives both operand coercion in the filter DSL and converter
/// dispatch when scaffolding forms.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnTy {
    /// Bounded string
    String { max_length: Option<usize> },

    /// Unbounded text
    Text,

    Boolean,

    Integer,

    /// Floating point / decimal
    Numeric,

    Date,

    DateTime,

    /// Closed set of string labels
    Enum(Vec<String>),

    /// JSON document stored as text
    Json,

    /// List of values of a single element type
    Array(Box<ColumnTy>),

    /// Canonical-string UUID
    Uuid,
}

impl ColumnTy {
    pub fn string() -> Self {
        Self::String { max_length: None }
    }

    /// The name used as the converter dispatch key.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Numeric => "numeric",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Enum(_) => "enum",
            Self::Json => "json",
            Self::Array(_) => "array",
            Self::Uuid => "uuid",
        }
    }

    /// Cast a raw string (URL operand or posted form value) to this column's
    /// value type.
    ///
    /// Returns the failure message on a bad cast; callers wrap it into a
    /// validation error carrying the field name.
    pub fn cast(&self, raw: &str) -> Result<Value, String> {
        match self {
            Self::String { .. } | Self::Text | Self::Uuid => Ok(Value::String(raw.to_string())),
            Self::Boolean => match raw {
                "true" | "on" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "off" | "0" | "no" | "" => Ok(Value::Bool(false)),
                _ => Err(format!("`{raw}` is not a valid boolean")),
            },
            Self::Integer => raw
                .parse::<i64>()
                .map(Value::I64)
                .map_err(|_| format!("`{raw}` is not a valid integer")),
            Self::Numeric => raw
                .parse::<f64>()
                .map(Value::F64)
                .map_err(|_| format!("`{raw}` is not a valid number")),
            Self::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| format!("`{raw}` is not a valid date (expected YYYY-MM-DD)")),
            Self::DateTime => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
                .map(Value::DateTime)
                .map_err(|_| format!("`{raw}` is not a valid datetime")),
            Self::Enum(labels) => {
                if labels.iter().any(|label| label == raw) {
                    Ok(Value::String(raw.to_string()))
                } else {
                    Err(format!("`{raw}` is not one of the allowed choices"))
                }
            }
            Self::Json => Ok(Value::Json(raw.to_string())),
            Self::Array(inner) => {
                if raw.is_empty() {
                    return Ok(Value::List(vec![]));
                }
                raw.split(',')
                    .map(|part| inner.cast(part.trim()))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
        }
    }
}
