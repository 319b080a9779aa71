//! Built-in field rules
//!
//! Each rule is constructed from its options (`from_options`) and checks a
//! single JSON value. Messages follow a fixed wording so clients can match on
//! them.

use super::{parse_options, scalar_to_string, NoOptions};
use crate::error::BuildError;
use crate::validators::Rule;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

const INVALID_SCALAR: &str = "Invalid type given. String, integer or float expected";
const INVALID_STRING: &str = "Invalid type given. String expected";
const EMPTY_STRING: &str = "The input is an empty string";
pub(crate) const IS_EMPTY: &str = "Value is required and can't be empty";

/// Accepts non-negative integers and strings made only of ASCII digits
#[derive(Debug, Clone, Default)]
pub struct Digits;

impl Digits {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        parse_options::<NoOptions>("digits", options)?;
        Ok(Self)
    }
}

impl Rule for Digits {
    fn check(&self, value: &Value) -> Result<(), String> {
        let text = scalar_to_string(value).ok_or_else(|| INVALID_SCALAR.to_string())?;
        if text.is_empty() {
            return Err(EMPTY_STRING.to_string());
        }
        if text.chars().all(|c| c.is_ascii_digit()) {
            Ok(())
        } else {
            Err("The input must contain only digits".to_string())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LetterOptions {
    allow_white_space: bool,
}

/// Accepts strings made only of alphabetic characters
#[derive(Debug, Clone, Default)]
pub struct Alpha {
    allow_white_space: bool,
}

impl Alpha {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        let options: LetterOptions = parse_options("alpha", options)?;
        Ok(Self {
            allow_white_space: options.allow_white_space,
        })
    }
}

impl Rule for Alpha {
    fn check(&self, value: &Value) -> Result<(), String> {
        let Value::String(text) = value else {
            return Err(INVALID_STRING.to_string());
        };
        if text.is_empty() {
            return Err(EMPTY_STRING.to_string());
        }
        let ok = text
            .chars()
            .all(|c| c.is_alphabetic() || (self.allow_white_space && c.is_whitespace()));
        if ok {
            Ok(())
        } else {
            Err("The input contains non alphabetic characters".to_string())
        }
    }
}

/// Accepts strings and numbers made only of alphanumeric characters
#[derive(Debug, Clone, Default)]
pub struct Alnum {
    allow_white_space: bool,
}

impl Alnum {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        let options: LetterOptions = parse_options("alnum", options)?;
        Ok(Self {
            allow_white_space: options.allow_white_space,
        })
    }
}

impl Rule for Alnum {
    fn check(&self, value: &Value) -> Result<(), String> {
        let text = scalar_to_string(value).ok_or_else(|| INVALID_SCALAR.to_string())?;
        if text.is_empty() {
            return Err(EMPTY_STRING.to_string());
        }
        let ok = text
            .chars()
            .all(|c| c.is_alphanumeric() || (self.allow_white_space && c.is_whitespace()));
        if ok {
            Ok(())
        } else {
            Err("The input contains characters which are non alphabetic and no digits".to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegexOptions {
    pattern: String,
}

/// Matches the stringified scalar against a pattern
#[derive(Debug, Clone)]
pub struct RegexRule {
    pattern: Regex,
}

impl RegexRule {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        let options: RegexOptions = parse_options("regex", options)?;
        let pattern = Regex::new(&options.pattern).map_err(|e| BuildError::InvalidOptions {
            name: "regex".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { pattern })
    }
}

impl Rule for RegexRule {
    fn check(&self, value: &Value) -> Result<(), String> {
        let text = scalar_to_string(value).ok_or_else(|| INVALID_SCALAR.to_string())?;
        if self.pattern.is_match(&text) {
            Ok(())
        } else {
            Err(format!(
                "The input does not match against pattern '{}'",
                self.pattern.as_str()
            ))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LengthOptions {
    min: usize,
    max: Option<usize>,
}

/// Bounds the character count of a string
#[derive(Debug, Clone)]
pub struct StringLength {
    min: usize,
    max: Option<usize>,
}

impl StringLength {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        let options: LengthOptions = parse_options("string_length", options)?;
        if let Some(max) = options.max {
            if max < options.min {
                return Err(BuildError::InvalidOptions {
                    name: "string_length".to_string(),
                    reason: format!("max {} is less than min {}", max, options.min),
                });
            }
        }
        Ok(Self {
            min: options.min,
            max: options.max,
        })
    }
}

impl Rule for StringLength {
    fn check(&self, value: &Value) -> Result<(), String> {
        let Value::String(text) = value else {
            return Err(INVALID_STRING.to_string());
        };
        let length = text.chars().count();
        if length < self.min {
            return Err(format!("The input is less than {} characters long", self.min));
        }
        match self.max {
            Some(max) if length > max => {
                Err(format!("The input is more than {} characters long", max))
            }
            _ => Ok(()),
        }
    }
}

/// Rejects null, empty strings, empty arrays and empty objects
#[derive(Debug, Clone, Default)]
pub struct NotEmpty;

impl NotEmpty {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        parse_options::<NoOptions>("not_empty", options)?;
        Ok(Self)
    }

    pub(crate) fn is_empty(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }
}

impl Rule for NotEmpty {
    fn check(&self, value: &Value) -> Result<(), String> {
        if Self::is_empty(value) {
            Err(IS_EMPTY.to_string())
        } else {
            Ok(())
        }
    }
}

fn default_inclusive() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BetweenOptions {
    min: f64,
    max: f64,
    #[serde(default = "default_inclusive")]
    inclusive: bool,
}

/// Bounds a numeric value (numbers or numeric strings)
#[derive(Debug, Clone)]
pub struct Between {
    min: f64,
    max: f64,
    inclusive: bool,
}

impl Between {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        let options: BetweenOptions = parse_options("between", options)?;
        if options.max < options.min {
            return Err(BuildError::InvalidOptions {
                name: "between".to_string(),
                reason: format!("max {} is less than min {}", options.max, options.min),
            });
        }
        Ok(Self {
            min: options.min,
            max: options.max,
            inclusive: options.inclusive,
        })
    }
}

impl Rule for Between {
    fn check(&self, value: &Value) -> Result<(), String> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| "The input is not numeric".to_string())?;

        let within = if self.inclusive {
            number >= self.min && number <= self.max
        } else {
            number > self.min && number < self.max
        };

        if within {
            Ok(())
        } else if self.inclusive {
            Err(format!(
                "The input is not between '{}' and '{}', inclusively",
                self.min, self.max
            ))
        } else {
            Err(format!(
                "The input is not strictly between '{}' and '{}'",
                self.min, self.max
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InArrayOptions {
    haystack: Vec<Value>,
    #[serde(default)]
    strict: bool,
}

/// Accepts only values listed in a haystack
///
/// Non-strict comparison matches scalars by their string form, so `"1"`
/// matches `1`.
#[derive(Debug, Clone)]
pub struct InArray {
    haystack: Vec<Value>,
    strict: bool,
}

impl InArray {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        let options: InArrayOptions = parse_options("in_array", options)?;
        Ok(Self {
            haystack: options.haystack,
            strict: options.strict,
        })
    }
}

impl Rule for InArray {
    fn check(&self, value: &Value) -> Result<(), String> {
        let found = if self.strict {
            self.haystack.contains(value)
        } else {
            let needle = scalar_to_string(value);
            self.haystack.iter().any(|candidate| {
                candidate == value
                    || (needle.is_some() && scalar_to_string(candidate) == needle)
            })
        };

        if found {
            Ok(())
        } else {
            Err("The input was not found in the haystack".to_string())
        }
    }
}

/// Loose `local@domain.tld` check
#[derive(Debug, Clone)]
pub struct EmailAddress {
    pattern: Regex,
}

impl EmailAddress {
    pub fn from_options(options: &Value) -> Result<Self, BuildError> {
        parse_options::<NoOptions>("email_address", options)?;
        let pattern = Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").map_err(|e| {
            BuildError::InvalidOptions {
                name: "email_address".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { pattern })
    }
}

impl Rule for EmailAddress {
    fn check(&self, value: &Value) -> Result<(), String> {
        let Value::String(text) = value else {
            return Err(INVALID_STRING.to_string());
        };
        if self.pattern.is_match(text) {
            Ok(())
        } else {
            Err("The input is not a valid email address".to_string())
        }
    }
}
