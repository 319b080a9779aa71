//! Core input filter traits and interfaces
//!
//! An input filter is anything that can be narrowed to a subset of its
//! fields, given body data, checked, and asked for per-field messages. The
//! gate only talks to validators through [`InputFilter`].

use super::{GroupError, ValidationReport};
use serde_json::{Map, Value};
use std::fmt;

/// Parsed body parameters: field name -> submitted value
pub type BodyParams = Map<String, Value>;

/// The capability every pluggable validator must implement.
///
/// Implementations are shared between concurrent requests, so `validate`
/// takes `&self` and reports through the returned [`ValidationReport`]
/// instead of storing per-request data on the instance.
pub trait InputFilter: Send + Sync + fmt::Debug {
    /// Names of the inputs this filter knows, in declaration order
    fn input_names(&self) -> Vec<&str>;

    /// Check if `name` is one of the filter's inputs
    fn has_input(&self, name: &str) -> bool {
        self.input_names().contains(&name)
    }

    /// Restrict validation to the given fields
    ///
    /// Fails on the first field the filter does not recognize.
    fn validation_group(&self, fields: &[&str]) -> Result<ValidationGroup, GroupError> {
        if let Some(unknown) = fields.iter().find(|field| !self.has_input(field)) {
            return Err(GroupError::UnknownInput {
                field: unknown.to_string(),
            });
        }
        Ok(ValidationGroup::new(fields.iter().map(|f| f.to_string())))
    }

    /// Run the filter against `data`
    ///
    /// With a non-empty `group` only the inputs in the group are validated.
    fn validate(&self, data: &BodyParams, group: Option<&ValidationGroup>) -> ValidationReport;
}

/// A single named check applied to one field value
pub trait Rule: Send + Sync + fmt::Debug {
    /// Check `value`, returning the failure message
    fn check(&self, value: &Value) -> Result<(), String>;
}

/// A normalization applied to a field value before its rules run
pub trait Filter: Send + Sync + fmt::Debug {
    fn filter(&self, value: Value) -> Value;
}

/// Subset of inputs activated for a partial (PATCH) validation.
///
/// An empty group places no restriction: every input is validated.
///
/// ```rust
/// use content_gate::validators::ValidationGroup;
///
/// let group = ValidationGroup::new(vec!["foo".to_string()]);
/// assert!(group.includes("foo"));
/// assert!(!group.includes("bar"));
/// assert_eq!(group.fields(), ["foo".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationGroup {
    fields: Vec<String>,
}

impl ValidationGroup {
    /// Create a group activating exactly `fields`
    pub fn new(fields: impl IntoIterator<Item = String>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Check if the group places no restriction
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `field` is active under this group
    pub fn includes(&self, field: &str) -> bool {
        self.fields.is_empty() || self.fields.iter().any(|f| f == field)
    }

    /// Active field names, in the order given
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fixed(Vec<&'static str>);

    impl InputFilter for Fixed {
        fn input_names(&self) -> Vec<&str> {
            self.0.clone()
        }

        fn validate(&self, _data: &BodyParams, _group: Option<&ValidationGroup>) -> ValidationReport {
            ValidationReport::new()
        }
    }

    #[test]
    fn test_default_group_accepts_known_fields() {
        let filter = Fixed(vec!["foo", "bar"]);
        let group = filter.validation_group(&["foo"]).unwrap();
        assert!(group.includes("foo"));
        assert!(!group.includes("bar"));
    }

    #[test]
    fn test_default_group_reports_first_unknown_field() {
        let filter = Fixed(vec!["foo", "bar"]);
        let err = filter.validation_group(&["foo", "baz", "qux"]).unwrap_err();
        assert_eq!(err, GroupError::UnknownInput { field: "baz".to_string() });
    }

    #[test]
    fn test_empty_group_includes_everything() {
        let group = ValidationGroup::default();
        assert!(group.is_empty());
        assert!(group.includes("anything"));
    }
}
