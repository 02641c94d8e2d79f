use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::models::non_null;

/// A value as it appears inside a generated `VALUES (...)` list
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    /// The database's current-time function
    Now,
    Text(String),
    Numeric(Decimal),
    Bool(bool),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Now => f.write_str("NOW()"),
            SqlValue::Text(s) => write!(f, "'{}'", escape(s)),
            SqlValue::Numeric(d) => write!(f, "{}", d),
            SqlValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Doubles embedded single quotes so the text is safe inside a `'...'` literal
pub fn escape(text: &str) -> String {
    text.replace('\'', "''")
}

pub fn text_or(value: &Option<String>, default: &str) -> SqlValue {
    SqlValue::Text(non_null(value).unwrap_or(default).to_string())
}

pub fn optional_text(value: &Option<String>) -> SqlValue {
    non_null(value).map_or(SqlValue::Null, |v| SqlValue::Text(v.to_string()))
}

pub fn timestamp_or_now(value: &Option<String>) -> SqlValue {
    non_null(value).map_or(SqlValue::Now, |v| SqlValue::Text(v.to_string()))
}

/// Parses a decimal the way the API serializes it, accepting exponent notation as a fallback
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// `Ok(None)` when the value is null-like, `Err(raw)` when it is present but not a number
pub fn numeric(value: &Option<String>) -> Result<Option<SqlValue>, String> {
    match non_null(value) {
        None => Ok(None),
        Some(raw) => parse_decimal(raw)
            .map(|d| Some(SqlValue::Numeric(d)))
            .ok_or_else(|| raw.to_string()),
    }
}
