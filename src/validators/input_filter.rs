//! Field-set input filter
//!
//! [`FieldSetFilter`] is the concrete [`InputFilter`] produced by the
//! factory: an ordered list of [`Input`]s, each with a filter chain and a
//! rule chain.

use super::builtin::{NotEmpty, IS_EMPTY};
use super::{BodyParams, Filter, InputFilter, Rule, ValidationGroup, ValidationReport};
use serde_json::Value;
use tracing::trace;

#[derive(Debug)]
struct RuleEntry {
    rule: Box<dyn Rule>,
    break_chain_on_failure: bool,
}

/// A single named field
#[derive(Debug)]
pub struct Input {
    name: String,
    required: bool,
    allow_empty: bool,
    error_message: Option<String>,
    filters: Vec<Box<dyn Filter>>,
    rules: Vec<RuleEntry>,
}

impl Input {
    /// Create a required input with no filters or rules
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            allow_empty: false,
            error_message: None,
            filters: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }

    /// Replace every failure message of this input with `message`
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn filter(mut self, filter: Box<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn rule(mut self, rule: Box<dyn Rule>, break_chain_on_failure: bool) -> Self {
        self.rules.push(RuleEntry {
            rule,
            break_chain_on_failure,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filter and check a submitted value
    ///
    /// Returns the filtered value (if one was submitted) and the failure
    /// messages.
    fn run(&self, submitted: Option<&Value>) -> (Option<Value>, Vec<String>) {
        let value = submitted.cloned().map(|value| {
            self.filters
                .iter()
                .fold(value, |value, filter| filter.filter(value))
        });

        let mut messages = Vec::new();
        match &value {
            None => {
                if self.required {
                    messages.push(IS_EMPTY.to_string());
                }
            }
            Some(v) if NotEmpty::is_empty(v) => {
                if self.required && !self.allow_empty {
                    messages.push(IS_EMPTY.to_string());
                }
            }
            Some(v) => {
                for entry in &self.rules {
                    if let Err(message) = entry.rule.check(v) {
                        messages.push(message);
                        if entry.break_chain_on_failure {
                            break;
                        }
                    }
                }
            }
        }

        if !messages.is_empty() {
            if let Some(message) = &self.error_message {
                messages = vec![message.clone()];
            }
        }

        (value, messages)
    }
}

/// Ordered collection of inputs
#[derive(Debug, Default)]
pub struct FieldSetFilter {
    inputs: Vec<Input>,
}

impl FieldSetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input, replacing any input with the same name
    pub fn add(mut self, input: Input) -> Self {
        match self.inputs.iter_mut().find(|i| i.name == input.name) {
            Some(existing) => *existing = input,
            None => self.inputs.push(input),
        }
        self
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl InputFilter for FieldSetFilter {
    fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|i| i.name.as_str()).collect()
    }

    fn has_input(&self, name: &str) -> bool {
        self.input(name).is_some()
    }

    fn validate(&self, data: &BodyParams, group: Option<&ValidationGroup>) -> ValidationReport {
        let mut report = ValidationReport::new();

        for input in &self.inputs {
            if !group.map_or(true, |g| g.includes(&input.name)) {
                continue;
            }

            let (value, messages) = input.run(data.get(&input.name));
            trace!(input = %input.name, failures = messages.len(), "Validated input");

            if let Some(value) = value {
                report.set_value(&input.name, value);
            }
            report.add_messages(&input.name, messages);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::builtin::{Alpha, Digits, StringLength, StringTrim};
    use serde_json::json;

    fn params(value: Value) -> BodyParams {
        value.as_object().cloned().unwrap()
    }

    fn foo_bar() -> FieldSetFilter {
        FieldSetFilter::new()
            .add(Input::new("foo").rule(Box::new(Digits), false))
            .add(Input::new("bar").rule(Box::new(Alpha::default()), false))
    }

    #[test]
    fn test_valid_data() {
        let report = foo_bar().validate(&params(json!({ "foo": 123, "bar": "abc" })), None);
        assert!(report.is_valid());
        assert_eq!(report.value("foo"), Some(&json!(123)));
    }

    #[test]
    fn test_invalid_data_reports_each_field() {
        let report = foo_bar().validate(&params(json!({ "foo": "abc", "bar": 123 })), None);
        assert!(!report.is_valid());
        assert_eq!(report.messages().len(), 2);
        assert!(!report.messages()["foo"].is_empty());
        assert!(!report.messages()["bar"].is_empty());
    }

    #[test]
    fn test_missing_required_input() {
        let report = foo_bar().validate(&params(json!({ "foo": 123 })), None);
        assert_eq!(report.messages()["bar"], vec![IS_EMPTY.to_string()]);
    }

    #[test]
    fn test_group_limits_validated_inputs() {
        let filter = foo_bar();
        let group = filter.validation_group(&["foo"]).unwrap();
        let report = filter.validate(&params(json!({ "foo": 123 })), Some(&group));
        assert!(report.is_valid());
        assert!(report.value("bar").is_none());
    }

    #[test]
    fn test_optional_and_empty_inputs() {
        let filter = FieldSetFilter::new()
            .add(Input::new("nick").required(false).rule(Box::new(Alpha::default()), false))
            .add(Input::new("note").allow_empty(true).rule(Box::new(Alpha::default()), false));

        let report = filter.validate(&params(json!({ "note": "" })), None);
        assert!(report.is_valid());
    }

    #[test]
    fn test_filters_run_before_rules() {
        let filter = FieldSetFilter::new().add(
            Input::new("code")
                .filter(Box::new(StringTrim))
                .rule(Box::new(Digits), false),
        );
        let report = filter.validate(&params(json!({ "code": " 42 " })), None);
        assert!(report.is_valid());
        assert_eq!(report.value("code"), Some(&json!("42")));
    }

    #[test]
    fn test_break_chain_and_error_message() {
        let length = StringLength::from_options(&json!({ "min": 5 })).unwrap();
        let chained = FieldSetFilter::new().add(
            Input::new("name")
                .rule(Box::new(Alpha::default()), true)
                .rule(Box::new(length), false),
        );
        let report = chained.validate(&params(json!({ "name": "a1" })), None);
        assert_eq!(report.messages()["name"].len(), 1);

        let overridden = FieldSetFilter::new().add(
            Input::new("name")
                .error_message("Name must be letters")
                .rule(Box::new(Alpha::default()), false),
        );
        let report = overridden.validate(&params(json!({ "name": "a1" })), None);
        assert_eq!(report.messages()["name"], vec!["Name must be letters".to_string()]);
    }

    #[test]
    fn test_add_replaces_same_name() {
        let filter = foo_bar().add(Input::new("foo").required(false));
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.input_names(), vec!["foo", "bar"]);
    }
}
