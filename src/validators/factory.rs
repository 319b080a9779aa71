//! Input filter factory - builds validators from declarative specs
//!
//! A spec maps field names to an [`InputSpec`] (flags, filter chain, rule
//! chain). Rule and filter names are resolved through constructor tables, so
//! applications can register their own named rules next to the built-ins.
//! Building is deterministic: the same spec always yields an equivalent
//! [`FieldSetFilter`].

use super::builtin;
use super::input_filter::{FieldSetFilter, Input};
use super::{Filter, Rule};
use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Builds a rule from its options
pub type RuleConstructor =
    Arc<dyn Fn(&Value) -> Result<Box<dyn Rule>, BuildError> + Send + Sync>;

/// Builds a filter from its options
pub type FilterConstructor =
    Arc<dyn Fn(&Value) -> Result<Box<dyn Filter>, BuildError> + Send + Sync>;

/// Field name -> input spec
pub type InputFilterSpec = BTreeMap<String, InputSpec>;

/// Declarative description of one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSpec {
    /// Missing or empty values fail (default: true)
    #[serde(default = "default_required")]
    pub required: bool,

    /// Empty values pass even when required
    #[serde(default)]
    pub allow_empty: bool,

    /// Single message replacing all failure messages of the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default)]
    pub filters: Vec<FilterSpec>,

    #[serde(default)]
    pub validators: Vec<RuleSpec>,
}

fn default_required() -> bool {
    true
}

impl Default for InputSpec {
    fn default() -> Self {
        Self {
            required: true,
            allow_empty: false,
            error_message: None,
            filters: Vec::new(),
            validators: Vec::new(),
        }
    }
}

/// A named rule plus its options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub name: String,

    #[serde(default)]
    pub options: Value,

    /// Stop checking the input's remaining rules when this one fails
    #[serde(default)]
    pub break_chain_on_failure: bool,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Value::Null,
            break_chain_on_failure: false,
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }
}

/// A named filter plus its options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    pub name: String,

    #[serde(default)]
    pub options: Value,
}

/// Factory of [`FieldSetFilter`]s
#[derive(Clone)]
pub struct InputFilterFactory {
    rules: HashMap<String, RuleConstructor>,
    filters: HashMap<String, FilterConstructor>,
}

impl InputFilterFactory {
    /// Create a factory with the built-in rules and filters registered
    pub fn new() -> Self {
        let mut factory = Self::empty();
        factory.register_builtins();
        factory
    }

    /// Create a factory that knows no rules or filters
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
            filters: HashMap::new(),
        }
    }

    fn register_builtins(&mut self) {
        self.register_rule("digits", |o| Ok(Box::new(builtin::Digits::from_options(o)?)));
        self.register_rule("alpha", |o| Ok(Box::new(builtin::Alpha::from_options(o)?)));
        self.register_rule("alnum", |o| Ok(Box::new(builtin::Alnum::from_options(o)?)));
        self.register_rule("regex", |o| Ok(Box::new(builtin::RegexRule::from_options(o)?)));
        self.register_rule("string_length", |o| {
            Ok(Box::new(builtin::StringLength::from_options(o)?))
        });
        self.register_rule("not_empty", |o| Ok(Box::new(builtin::NotEmpty::from_options(o)?)));
        self.register_rule("between", |o| Ok(Box::new(builtin::Between::from_options(o)?)));
        self.register_rule("in_array", |o| Ok(Box::new(builtin::InArray::from_options(o)?)));
        self.register_rule("email_address", |o| {
            Ok(Box::new(builtin::EmailAddress::from_options(o)?))
        });

        self.register_filter("string_trim", |o| {
            Ok(Box::new(builtin::StringTrim::from_options(o)?))
        });
        self.register_filter("string_to_lower", |o| {
            Ok(Box::new(builtin::StringToLower::from_options(o)?))
        });
        self.register_filter("string_to_upper", |o| {
            Ok(Box::new(builtin::StringToUpper::from_options(o)?))
        });
        self.register_filter("digits", |o| {
            Ok(Box::new(builtin::StripNonDigits::from_options(o)?))
        });
        self.register_filter("to_int", |o| Ok(Box::new(builtin::ToInt::from_options(o)?)));
    }

    /// Register a named rule (names are case-insensitive)
    pub fn register_rule<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&Value) -> Result<Box<dyn Rule>, BuildError> + Send + Sync + 'static,
    {
        self.rules.insert(name.to_lowercase(), Arc::new(constructor));
    }

    /// Register a named filter (names are case-insensitive)
    pub fn register_filter<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&Value) -> Result<Box<dyn Filter>, BuildError> + Send + Sync + 'static,
    {
        self.filters.insert(name.to_lowercase(), Arc::new(constructor));
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.contains_key(&name.to_lowercase())
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains_key(&name.to_lowercase())
    }

    /// Build an input filter from a spec
    pub fn build(&self, spec: &InputFilterSpec) -> Result<FieldSetFilter, BuildError> {
        let mut filter = FieldSetFilter::new();

        for (field, input_spec) in spec {
            filter = filter.add(self.build_input(field, input_spec)?);
        }

        debug!(inputs = filter.len(), "Built input filter");
        Ok(filter)
    }

    fn build_input(&self, field: &str, spec: &InputSpec) -> Result<Input, BuildError> {
        let mut input = Input::new(field)
            .required(spec.required)
            .allow_empty(spec.allow_empty);

        if let Some(message) = &spec.error_message {
            input = input.error_message(message.clone());
        }

        for filter_spec in &spec.filters {
            let constructor = self
                .filters
                .get(&filter_spec.name.to_lowercase())
                .ok_or_else(|| BuildError::UnknownFilter {
                    input: field.to_string(),
                    filter: filter_spec.name.clone(),
                })?;
            input = input.filter(constructor(&filter_spec.options)?);
        }

        for rule_spec in &spec.validators {
            let constructor = self
                .rules
                .get(&rule_spec.name.to_lowercase())
                .ok_or_else(|| BuildError::UnknownRule {
                    input: field.to_string(),
                    rule: rule_spec.name.clone(),
                })?;
            input = input.rule(constructor(&rule_spec.options)?, rule_spec.break_chain_on_failure);
        }

        Ok(input)
    }
}

impl Default for InputFilterFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InputFilterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rules: Vec<_> = self.rules.keys().collect();
        rules.sort();
        let mut filters: Vec<_> = self.filters.keys().collect();
        filters.sort();

        f.debug_struct("InputFilterFactory")
            .field("rules", &rules)
            .field("filters", &filters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::InputFilter;
    use serde_json::json;

    fn foo_bar_spec() -> InputFilterSpec {
        let mut spec = InputFilterSpec::new();
        spec.insert(
            "foo".to_string(),
            InputSpec {
                validators: vec![RuleSpec::new("digits")],
                ..Default::default()
            },
        );
        spec.insert(
            "bar".to_string(),
            InputSpec {
                validators: vec![RuleSpec::new("regex").with_options(json!({ "pattern": "(?i)^[a-z]+" }))],
                ..Default::default()
            },
        );
        spec
    }

    #[test]
    fn test_build_from_spec() {
        let filter = InputFilterFactory::new().build(&foo_bar_spec()).unwrap();
        assert!(filter.has_input("foo"));
        assert!(filter.has_input("bar"));

        let data = json!({ "foo": 123, "bar": "abc" });
        assert!(filter.validate(data.as_object().unwrap(), None).is_valid());
    }

    #[test]
    fn test_build_is_deterministic() {
        let factory = InputFilterFactory::new();
        let first = factory.build(&foo_bar_spec()).unwrap();
        let second = factory.build(&foo_bar_spec()).unwrap();

        let data = json!({ "foo": "abc", "bar": 123 });
        let data = data.as_object().unwrap();
        assert_eq!(first.input_names(), second.input_names());
        assert_eq!(first.validate(data, None), second.validate(data, None));
    }

    #[test]
    fn test_unknown_rule_fails_build() {
        let mut spec = InputFilterSpec::new();
        spec.insert(
            "foo".to_string(),
            InputSpec {
                validators: vec![RuleSpec::new("no_such_rule")],
                ..Default::default()
            },
        );

        let err = InputFilterFactory::new().build(&spec).unwrap_err();
        assert_eq!(
            err,
            BuildError::UnknownRule {
                input: "foo".to_string(),
                rule: "no_such_rule".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_filter_fails_build() {
        let mut spec = InputFilterSpec::new();
        spec.insert(
            "foo".to_string(),
            InputSpec {
                filters: vec![FilterSpec {
                    name: "rot13".to_string(),
                    options: Value::Null,
                }],
                ..Default::default()
            },
        );

        let err = InputFilterFactory::new().build(&spec).unwrap_err();
        assert!(matches!(err, BuildError::UnknownFilter { .. }));
    }

    #[test]
    fn test_custom_rule_registration() {
        #[derive(Debug)]
        struct Even;

        impl Rule for Even {
            fn check(&self, value: &Value) -> Result<(), String> {
                match value.as_i64() {
                    Some(n) if n % 2 == 0 => Ok(()),
                    _ => Err("The input must be even".to_string()),
                }
            }
        }

        let mut factory = InputFilterFactory::empty();
        factory.register_rule("Even", |_| Ok(Box::new(Even)));
        assert!(factory.has_rule("even"));
        assert!(!factory.has_rule("digits"));

        let mut spec = InputFilterSpec::new();
        spec.insert(
            "n".to_string(),
            InputSpec {
                validators: vec![RuleSpec::new("EVEN")],
                ..Default::default()
            },
        );
        let filter = factory.build(&spec).unwrap();
        let data = json!({ "n": 3 });
        let report = filter.validate(data.as_object().unwrap(), None);
        assert_eq!(report.messages()["n"], vec!["The input must be even".to_string()]);
    }

    #[test]
    fn test_spec_from_toml() {
        let spec: InputFilterSpec = toml::from_str(
            r#"
[name]
required = true
filters = [{ name = "string_trim" }]
validators = [{ name = "string_length", options = { min = 3 }, break_chain_on_failure = true }]

[age]
required = false
validators = [{ name = "between", options = { min = 0, max = 150 } }]
"#,
        )
        .unwrap();

        assert_eq!(spec.len(), 2);
        assert!(!spec["age"].required);
        assert!(spec["name"].validators[0].break_chain_on_failure);
        assert!(InputFilterFactory::new().build(&spec).is_ok());
    }
}
