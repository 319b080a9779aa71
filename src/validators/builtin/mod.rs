//! Built-in rules and filters

mod filters;
mod validators;

pub use filters::{StringToLower, StringToUpper, StringTrim, StripNonDigits, ToInt};
pub(crate) use validators::IS_EMPTY;
pub use validators::{
    Alnum, Alpha, Between, Digits, EmailAddress, InArray, NotEmpty, RegexRule, StringLength,
};

use crate::error::BuildError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Options of rules and filters that take none; any key is rejected
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NoOptions {}

/// Deserialize rule or filter options, treating absent options as `{}`
pub(crate) fn parse_options<T: DeserializeOwned>(name: &str, options: &Value) -> Result<T, BuildError> {
    let options = if options.is_null() {
        Value::Object(Default::default())
    } else {
        options.clone()
    };

    serde_json::from_value(options).map_err(|e| BuildError::InvalidOptions {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Render a scalar as the string a text rule would see
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_options_accepts_absent_or_empty() {
        assert!(parse_options::<NoOptions>("digits", &Value::Null).is_ok());
        assert!(parse_options::<NoOptions>("digits", &json!({})).is_ok());
        assert!(StringTrim::from_options(&Value::Null).is_ok());
        assert!(Digits::from_options(&json!({})).is_ok());
    }

    #[test]
    fn test_no_options_rejects_any_key() {
        let err = parse_options::<NoOptions>("string_trim", &json!({ "max": 3 })).unwrap_err();
        assert!(matches!(err, BuildError::InvalidOptions { ref name, .. } if name == "string_trim"));
        assert!(ToInt::from_options(&json!({ "base": 16 })).is_err());
        assert!(EmailAddress::from_options(&json!({ "strict": true })).is_err());
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&json!(12)), Some("12".to_string()));
        assert_eq!(scalar_to_string(&json!("ab")), Some("ab".to_string()));
        assert_eq!(scalar_to_string(&json!([1])), None);
    }
}
