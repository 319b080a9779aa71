//! Configuration structures for the content validation gate.
//!
//! Two tables drive the gate: `content_validation` maps handler identifiers
//! to the input filter names used for them, and `input_filter_specs` declares
//! input filters that are built on demand.
//!
//! # Example TOML
//! ```toml
//! [content_validation.Foo]
//! input_filter = "FooValidator"
//! PATCH = "FooPatchValidator"
//!
//! [input_filter_specs.FooValidator.foo]
//! validators = [{ name = "digits" }]
//! ```

use crate::error::ConfigError;
use crate::gate::ContentValidationGate;
use crate::services::{InputFilterAbstractFactory, ServiceManager};
use crate::validators::{InputFilterFactory, InputFilterRegistry, InputFilterSpec};
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Handler identifier -> validation spec
    #[serde(default)]
    pub content_validation: HashMap<String, RouteValidationSpec>,

    /// Input filter name -> declarative spec
    #[serde(default)]
    pub input_filter_specs: BTreeMap<String, InputFilterSpec>,
}

/// Input filter names configured for one handler
///
/// # Example TOML
/// ```toml
/// [content_validation.Foo]
/// input_filter = "FooValidator"
/// POST = "FooCreateValidator"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteValidationSpec {
    /// Generic input filter; required for any validation to run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_filter: Option<String>,

    #[serde(default, rename = "POST", skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,

    #[serde(default, rename = "PATCH", skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    #[serde(default, rename = "PUT", skip_serializing_if = "Option::is_none")]
    pub put: Option<String>,
}

impl RouteValidationSpec {
    /// Spec with only a generic input filter
    pub fn generic(name: impl Into<String>) -> Self {
        Self {
            input_filter: Some(name.into()),
            ..Default::default()
        }
    }

    /// Set the input filter for POST, PATCH or PUT; other methods are ignored
    pub fn with_method(mut self, method: Method, name: impl Into<String>) -> Self {
        let name = Some(name.into());
        match method {
            Method::POST => self.post = name,
            Method::PATCH => self.patch = name,
            Method::PUT => self.put = name,
            other => warn!(method = %other, "Method-specific input filters apply to POST, PATCH and PUT only"),
        }
        self
    }

    /// Input filter configured for exactly this method
    pub fn method_specific(&self, method: &Method) -> Option<&str> {
        match *method {
            Method::POST => self.post.as_deref(),
            Method::PATCH => self.patch.as_deref(),
            Method::PUT => self.put.as_deref(),
            _ => None,
        }
    }

    /// Input filter to run for `method`: method-specific first, then generic
    pub fn input_filter_for(&self, method: &Method) -> Option<&str> {
        self.method_specific(method)
            .or(self.input_filter.as_deref())
    }

    /// Whether any method-specific name is set
    pub fn has_method_specific(&self) -> bool {
        self.post.is_some() || self.patch.is_some() || self.put.is_some()
    }

    /// Every input filter name this spec refers to
    pub fn referenced_names(&self) -> impl Iterator<Item = &str> {
        [&self.input_filter, &self.post, &self.patch, &self.put]
            .into_iter()
            .filter_map(|name| name.as_deref())
    }
}

/// Immutable handler -> validation spec lookup used by the gate
#[derive(Debug, Clone, Default)]
pub struct RouteValidationConfig {
    routes: HashMap<String, RouteValidationSpec>,
}

impl RouteValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, handler: impl Into<String>, spec: RouteValidationSpec) -> Self {
        self.routes.insert(handler.into(), spec);
        self
    }

    pub fn get(&self, handler: &str) -> Option<&RouteValidationSpec> {
        self.routes.get(handler)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Handler identifiers, sorted
    pub fn handlers(&self) -> Vec<&str> {
        let mut handlers: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        handlers.sort_unstable();
        handlers
    }
}

impl From<HashMap<String, RouteValidationSpec>> for RouteValidationConfig {
    fn from(routes: HashMap<String, RouteValidationSpec>) -> Self {
        Self { routes }
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(contents)?)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        contents.parse()
    }

    /// Check the configuration before serving requests
    ///
    /// Every declared spec is built once so unknown rules or filters and bad
    /// options fail here instead of on a request. Handler entries that can
    /// never validate, or that name undeclared input filters, are logged.
    pub fn validate(&self, factory: &InputFilterFactory) -> Result<(), ConfigError> {
        for (name, spec) in &self.input_filter_specs {
            factory.build(spec).map_err(|source| ConfigError::Spec {
                name: name.clone(),
                source,
            })?;
        }

        let mut handlers: Vec<_> = self.content_validation.iter().collect();
        handlers.sort_by(|a, b| a.0.cmp(b.0));

        for (handler, spec) in handlers {
            if spec.input_filter.is_none() && spec.has_method_specific() {
                warn!(
                    handler = %handler,
                    "Handler has method-specific input filters but no input_filter; requests will not be validated"
                );
            }
            for name in spec.referenced_names() {
                if !self.input_filter_specs.contains_key(name) {
                    warn!(
                        handler = %handler,
                        input_filter = name,
                        "Input filter has no spec; it must be registered as a service"
                    );
                }
            }
        }

        info!(
            "✅ Configuration valid: {} handler(s), {} input filter spec(s)",
            self.content_validation.len(),
            self.input_filter_specs.len()
        );
        Ok(())
    }

    /// Split into the gate's route config and the input filter specs
    pub fn into_parts(self) -> (RouteValidationConfig, BTreeMap<String, InputFilterSpec>) {
        (self.content_validation.into(), self.input_filter_specs)
    }

    /// Validate and wire a gate
    ///
    /// Declared specs become an abstract factory on `services`, so live
    /// services registered beforehand take precedence over specs with the
    /// same name.
    pub fn into_gate(
        self,
        factory: InputFilterFactory,
        mut services: ServiceManager,
    ) -> Result<ContentValidationGate, ConfigError> {
        self.validate(&factory)?;

        let (routes, specs) = self.into_parts();
        services.add_abstract_factory(Arc::new(InputFilterAbstractFactory::new(specs, factory)));
        let registry = InputFilterRegistry::new(Arc::new(services));

        Ok(ContentValidationGate::new(routes, Arc::new(registry)))
    }
}
