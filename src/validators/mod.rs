//! Validator framework for the content validation gate
//!
//! This module provides the validator side of the gate: the capability
//! trait every input filter implements, a factory that builds input filters
//! from declarative specs, and a registry that resolves and caches them by
//! name.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │       Input Filter Registry             │
//! ├─────────────────────────────────────────┤
//! │  • Resolve input filters by name        │
//! │  • Reject services that can't validate  │
//! │  • Cache instances for process lifetime │
//! └────────┬────────────────────────────────┘
//!          │
//!          └──> Service Locator
//!                 ├──> Live input filters
//!                 └──> Input Filter Factory (specs -> FieldSetFilter)
//!                        ├──> Built-in rules (digits, regex, ...)
//!                        └──> Built-in filters (string_trim, ...)
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use content_gate::validators::*;
//! use serde_json::json;
//!
//! let mut spec = InputFilterSpec::new();
//! spec.insert("foo".to_string(), InputSpec {
//!     validators: vec![RuleSpec::new("digits")],
//!     ..Default::default()
//! });
//!
//! let filter = InputFilterFactory::new().build(&spec).unwrap();
//! let data = json!({ "foo": "abc" });
//! let report = filter.validate(data.as_object().unwrap(), None);
//! assert!(!report.is_valid());
//! ```

pub mod builtin;
pub mod factory;
pub mod input_filter;
pub mod registry;
pub mod result;
pub mod traits;

// Re-export commonly used types
pub use factory::{FilterSpec, InputFilterFactory, InputFilterSpec, InputSpec, RuleSpec};
pub use input_filter::{FieldSetFilter, Input};
pub use registry::InputFilterRegistry;
pub use result::{GroupError, ValidationReport};
pub use traits::{BodyParams, Filter, InputFilter, Rule, ValidationGroup};
