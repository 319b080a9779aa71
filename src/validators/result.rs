//! Validation result types

use crate::problem::ValidationMessages;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Outcome of running an input filter over a set of body parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Filtered values of the inputs that were validated
    values: Map<String, Value>,

    /// Messages of the inputs that failed
    messages: ValidationMessages,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the filtered value of an input
    pub fn set_value(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }

    /// Record failure messages for an input
    ///
    /// An empty list is ignored so that a field is never reported as failed
    /// without saying why.
    pub fn add_messages(&mut self, field: &str, messages: Vec<String>) {
        if messages.is_empty() {
            return;
        }
        self.messages
            .entry(field.to_string())
            .or_default()
            .extend(messages);
    }

    /// Check if every validated input passed
    pub fn is_valid(&self) -> bool {
        self.messages.is_empty()
    }

    /// Per-field messages
    pub fn messages(&self) -> &ValidationMessages {
        &self.messages
    }

    /// Filtered values
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Filtered value of a single input
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn into_messages(self) -> ValidationMessages {
        self.messages
    }
}

/// Error raised while narrowing an input filter to a validation group
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupError {
    /// The submitted field is not an input of the filter
    #[error("expects a list of valid input names; \"{field}\" was not found")]
    UnknownInput { field: String },

    /// Any other refusal by a custom input filter
    #[error("{0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_validity_follows_messages() {
        let mut report = ValidationReport::new();
        report.set_value("foo", json!(123));
        assert!(report.is_valid());

        report.add_messages("bar", vec![]);
        assert!(report.is_valid());

        report.add_messages("bar", vec!["The input contains non alphabetic characters".to_string()]);
        assert!(!report.is_valid());
        assert_eq!(report.messages()["bar"].len(), 1);
        assert_eq!(report.value("foo"), Some(&json!(123)));
    }

    #[test]
    fn test_group_error_message() {
        let err = GroupError::UnknownInput { field: "baz".to_string() };
        assert_eq!(
            err.to_string(),
            "expects a list of valid input names; \"baz\" was not found"
        );
    }
}
