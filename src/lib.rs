//! # content-gate
//!
//! Per-handler validation of request bodies for HTTP request pipelines.
//!
//! A [`ContentValidationGate`] sits in a [`Pipeline`] after content
//! negotiation and before the handler. It looks up the input filter
//! configured for the matched handler and HTTP method, validates the parsed
//! body against it, and either lets the request through or stops it with an
//! [`ApiProblem`].
//!
//! ```no_run
//! use content_gate::{Config, InputFilterFactory, Pipeline, ServiceManager};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), content_gate::error::ConfigError> {
//! let config = Config::from_file("content-gate.toml")?;
//! let gate = Arc::new(config.into_gate(InputFilterFactory::new(), ServiceManager::new())?);
//!
//! let mut pipeline = Pipeline::new();
//! gate.attach(&mut pipeline);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod evaluate;
pub mod gate;
pub mod pipeline;
pub mod problem;
pub mod services;
pub mod telemetry;
pub mod validators;

pub use config::{Config, RouteValidationConfig, RouteValidationSpec};
pub use evaluate::{run_evaluate, EvaluateRequest, Evaluation};
pub use gate::{ContentValidationGate, Outcome, ValidatedInput, ValidatedInputExt, INPUT_FILTER_PARAM};
pub use pipeline::{ParameterData, Pipeline, RequestEvent, RouteMatch, Stage, StageId};
pub use problem::{ApiProblem, PROBLEM_CONTENT_TYPE};
pub use services::{AbstractFactory, InputFilterAbstractFactory, Service, ServiceLocator, ServiceManager};
pub use validators::{InputFilter, InputFilterFactory, InputFilterRegistry};
