//! Content validation gate
//!
//! The gate runs after authentication, authorization and content
//! negotiation, and before the handler. For the matched handler it looks up
//! the configured input filter, runs it against the parsed body parameters,
//! and either lets the request continue or stops it with a problem:
//!
//! | Condition                                        | Status |
//! |--------------------------------------------------|--------|
//! | configured input filter does not resolve         | 500    |
//! | no parameter data (content negotiation missing)  | 500    |
//! | body is not a mapping                            | 400    |
//! | PATCH names a field the input filter doesn't know | 400    |
//! | input filter rejects the data                    | 422    |
//!
//! On success the resolved input filter and its report are published on the
//! request under [`INPUT_FILTER_PARAM`].

use crate::config::RouteValidationConfig;
use crate::pipeline::{priority, Pipeline, RequestEvent, Stage, StageId};
use crate::problem::ApiProblem;
use crate::validators::{
    BodyParams, GroupError, InputFilter, InputFilterRegistry, ValidationGroup, ValidationReport,
};
use async_trait::async_trait;
use http::{Method, StatusCode};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Parameter key under which a [`ValidatedInput`] is published
pub const INPUT_FILTER_PARAM: &str = "content_validation.input_filter";

/// Decision for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Continue to the next stage
    Pass,

    /// Stop the request with this problem
    Fail(ApiProblem),
}

impl Outcome {
    /// Check if the request may continue
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    /// The problem the request was stopped with
    pub fn problem(&self) -> Option<&ApiProblem> {
        match self {
            Outcome::Pass => None,
            Outcome::Fail(problem) => Some(problem),
        }
    }

    /// Consume the outcome, keeping only the problem
    pub fn into_problem(self) -> Option<ApiProblem> {
        match self {
            Outcome::Pass => None,
            Outcome::Fail(problem) => Some(problem),
        }
    }

    fn fail(status: StatusCode, detail: impl Into<String>) -> Self {
        Outcome::Fail(ApiProblem::new(status, detail))
    }
}

/// The input filter that validated a request, and what it reported
#[derive(Debug, Clone)]
pub struct ValidatedInput {
    name: String,
    filter: Arc<dyn InputFilter>,
    report: ValidationReport,
}

impl ValidatedInput {
    /// Name the input filter was resolved by
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared input filter instance
    pub fn filter(&self) -> &Arc<dyn InputFilter> {
        &self.filter
    }

    /// Per-field results, including filtered values
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Filtered value of a single field
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.report.value(field)
    }
}

/// Methods whose requests carry no body to validate
const METHODS_WITHOUT_BODIES: [Method; 4] =
    [Method::GET, Method::HEAD, Method::OPTIONS, Method::DELETE];

/// Name of the collaborator that publishes parameter data, used in problems
const CONTENT_NEGOTIATION: &str = "Content negotiation";

/// Request gate enforcing per-handler input validation
pub struct ContentValidationGate {
    config: RouteValidationConfig,
    registry: Arc<InputFilterRegistry>,
}

impl ContentValidationGate {
    /// Priority the gate attaches at
    pub const PRIORITY: i32 = priority::CONTENT_VALIDATION;

    /// Create a gate for the given routes, resolving input filters through `registry`
    pub fn new(config: RouteValidationConfig, registry: Arc<InputFilterRegistry>) -> Self {
        Self { config, registry }
    }

    /// Handler -> input filter configuration
    pub fn config(&self) -> &RouteValidationConfig {
        &self.config
    }

    /// Registry the gate resolves input filters from
    pub fn registry(&self) -> &Arc<InputFilterRegistry> {
        &self.registry
    }

    /// Attach the gate to a pipeline at [`Self::PRIORITY`]
    pub fn attach(self: &Arc<Self>, pipeline: &mut Pipeline) -> StageId {
        pipeline.attach(Arc::clone(self) as Arc<dyn Stage>, Self::PRIORITY)
    }

    /// Decide whether the request may continue
    ///
    /// On [`Outcome::Pass`] after validation ran, the event carries a
    /// [`ValidatedInput`] under [`INPUT_FILTER_PARAM`]. Early passes (no body,
    /// no route, no configuration) leave the event untouched.
    pub fn evaluate(&self, event: &mut RequestEvent) -> Outcome {
        let method = event.method().clone();
        if METHODS_WITHOUT_BODIES.contains(&method) {
            debug!(%method, "Method carries no body; skipping validation");
            return Outcome::Pass;
        }

        let Some(handler) = event.route_match().and_then(|m| m.handler()) else {
            debug!(path = event.path(), "No handler matched; skipping validation");
            return Outcome::Pass;
        };

        let Some(spec) = self.config.get(handler) else {
            debug!(handler, "No validation configured for handler");
            return Outcome::Pass;
        };

        // Only the generic name decides whether validation runs at all;
        // method-specific names take over once it does.
        if spec.input_filter.is_none() {
            debug!(handler, "No generic input filter configured; skipping validation");
            return Outcome::Pass;
        }
        let Some(name) = spec.input_filter_for(&method) else {
            return Outcome::Pass;
        };
        let name = name.to_string();
        let handler = handler.to_string();

        let Some(filter) = self.registry.resolve(&name) else {
            error!(handler = %handler, input_filter = %name, "❌ Configured input filter does not exist");
            return Outcome::fail(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "Listed input filter \"{}\" does not exist; cannot validate request",
                    name
                ),
            );
        };

        let Some(parameter_data) = event.parameter_data() else {
            error!(handler = %handler, "❌ No parameter data on request; is content negotiation attached?");
            return Outcome::fail(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "{} module is not initialized; cannot validate request",
                    CONTENT_NEGOTIATION
                ),
            );
        };

        let data = match body_params(parameter_data.body_params()) {
            Some(data) => data,
            None => {
                warn!(handler = %handler, "Request body is not a mapping");
                return Outcome::fail(
                    StatusCode::BAD_REQUEST,
                    "Request body must be a mapping of field names to values",
                );
            }
        };

        let group = if method == Method::PATCH {
            match partial_group(filter.as_ref(), &data) {
                Ok(group) => Some(group),
                Err(outcome) => {
                    warn!(handler = %handler, input_filter = %name, "Rejected partial update");
                    return outcome;
                }
            }
        } else {
            None
        };

        let report = filter.validate(&data, group.as_ref());
        if !report.is_valid() {
            warn!(
                handler = %handler,
                input_filter = %name,
                fields = ?report.messages().keys().collect::<Vec<_>>(),
                "Request failed validation"
            );
            return Outcome::Fail(
                ApiProblem::new(StatusCode::UNPROCESSABLE_ENTITY, "Failed Validation")
                    .with_validation_messages(report.into_messages()),
            );
        }

        debug!(handler = %handler, input_filter = %name, "Request passed validation");
        event.params_mut().set(
            INPUT_FILTER_PARAM,
            ValidatedInput {
                name,
                filter,
                report,
            },
        );
        Outcome::Pass
    }
}

/// Body parameters as a mapping; null and empty string count as empty
fn body_params(body: &Value) -> Option<BodyParams> {
    match body {
        Value::Null => Some(BodyParams::new()),
        Value::String(s) if s.is_empty() => Some(BodyParams::new()),
        Value::Object(map) => Some(map.clone()),
        _ => None,
    }
}

/// Narrow `filter` to the submitted fields of a PATCH request
fn partial_group(filter: &dyn InputFilter, data: &BodyParams) -> Result<ValidationGroup, Outcome> {
    let fields: Vec<&str> = data.keys().map(String::as_str).collect();
    filter.validation_group(&fields).map_err(|e| match e {
        GroupError::UnknownInput { field } => Outcome::fail(
            StatusCode::BAD_REQUEST,
            format!("Unrecognized field \"{}\"", field),
        ),
        other => Outcome::fail(StatusCode::BAD_REQUEST, other.to_string()),
    })
}

#[async_trait]
impl Stage for ContentValidationGate {
    fn name(&self) -> &str {
        "content-validation"
    }

    async fn handle(&self, event: &mut RequestEvent) -> Option<ApiProblem> {
        self.evaluate(event).into_problem()
    }
}

impl fmt::Debug for ContentValidationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentValidationGate")
            .field("handlers", &self.config.len())
            .field("registry", &self.registry)
            .finish()
    }
}

/// Access to what the gate published on a request
pub trait ValidatedInputExt {
    /// The input filter that validated this request, if validation ran
    fn validated_input(&self) -> Option<Arc<ValidatedInput>>;
}

impl ValidatedInputExt for RequestEvent {
    fn validated_input(&self) -> Option<Arc<ValidatedInput>> {
        self.params().get(INPUT_FILTER_PARAM)
    }
}
