//! Built-in filters
//!
//! Filters never fail; a value a filter does not apply to passes through
//! unchanged.

use super::{parse_options, NoOptions};
use crate::error::BuildError;
use crate::validators::Filter;
use serde_json::Value;

/// Strips leading and trailing whitespace from strings
#[derive(Debug, Clone, Default)]
pub struct StringTrim;

impl StringTrim {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        parse_options::<NoOptions>("string_trim", options)?;
        Ok(Self)
    }
}

impl Filter for StringTrim {
    fn filter(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringToLower;

impl StringToLower {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        parse_options::<NoOptions>("string_to_lower", options)?;
        Ok(Self)
    }
}

impl Filter for StringToLower {
    fn filter(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(s.to_lowercase()),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringToUpper;

impl StringToUpper {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        parse_options::<NoOptions>("string_to_upper", options)?;
        Ok(Self)
    }
}

impl Filter for StringToUpper {
    fn filter(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other,
        }
    }
}

/// Removes every non-digit character from strings (`digits` filter)
#[derive(Debug, Clone, Default)]
pub struct StripNonDigits;

impl StripNonDigits {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        parse_options::<NoOptions>("digits", options)?;
        Ok(Self)
    }
}

impl Filter for StripNonDigits {
    fn filter(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(s.chars().filter(|c| c.is_ascii_digit()).collect()),
            other => other,
        }
    }
}

/// Converts integer-looking strings, floats and booleans to integers
#[derive(Debug, Clone, Default)]
pub struct ToInt;

impl ToInt {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        parse_options::<NoOptions>("to_int", options)?;
        Ok(Self)
    }
}

impl Filter for ToInt {
    fn filter(&self, value: Value) -> Value {
        match value {
            Value::String(s) => match s.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(s),
            },
            Value::Number(n) if !n.is_i64() && !n.is_u64() => match n.as_f64() {
                Some(f) if f.is_finite() => Value::from(f.trunc() as i64),
                _ => Value::Number(n),
            },
            Value::Bool(b) => Value::from(i64::from(b)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_filters() {
        assert_eq!(StringTrim.filter(json!("  abc ")), json!("abc"));
        assert_eq!(StringToLower.filter(json!("AbC")), json!("abc"));
        assert_eq!(StringToUpper.filter(json!("AbC")), json!("ABC"));
        assert_eq!(StripNonDigits.filter(json!("12-34 x")), json!("1234"));
    }

    #[test]
    fn test_filters_pass_through_other_types() {
        assert_eq!(StringTrim.filter(json!(12)), json!(12));
        assert_eq!(StripNonDigits.filter(json!(null)), json!(null));
    }

    #[test]
    fn test_to_int() {
        assert_eq!(ToInt.filter(json!(" 42 ")), json!(42));
        assert_eq!(ToInt.filter(json!(3.9)), json!(3));
        assert_eq!(ToInt.filter(json!(true)), json!(1));
        assert_eq!(ToInt.filter(json!("forty")), json!("forty"));
        assert_eq!(ToInt.filter(json!(7)), json!(7));
    }
}
