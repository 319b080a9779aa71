//! One-shot request evaluation
//!
//! Runs a single request through a pipeline made of a content negotiation
//! stage, which publishes the given body, and the gate. This is what the
//! `evaluate` command of the binary does.

use crate::gate::{ContentValidationGate, ValidatedInput, ValidatedInputExt};
use crate::pipeline::{priority, FnStage, ParameterData, Pipeline, RequestEvent, RouteMatch};
use crate::problem::ApiProblem;
use http::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// A request to run through the gate
#[derive(Debug, Clone)]
pub struct EvaluateRequest {
    /// Handler the request was routed to
    pub handler: String,

    pub method: Method,

    /// Request path, for logging
    pub path: String,

    /// Parsed body (null means an empty body)
    pub body: Value,
}

impl EvaluateRequest {
    /// Create a request for `handler` with an empty body at `/`
    pub fn new(method: Method, handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            method,
            path: "/".to_string(),
            body: Value::Null,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

/// What happened to an evaluated request
#[derive(Debug)]
pub enum Evaluation {
    /// The request reached the handler; carries what the gate published, if
    /// validation ran
    Passed(Option<Arc<ValidatedInput>>),

    /// A stage stopped the request
    Rejected(ApiProblem),
}

impl Evaluation {
    /// Check if the request reached the handler
    pub fn is_pass(&self) -> bool {
        matches!(self, Evaluation::Passed(_))
    }

    /// The problem a stage stopped the request with
    pub fn problem(&self) -> Option<&ApiProblem> {
        match self {
            Evaluation::Passed(_) => None,
            Evaluation::Rejected(problem) => Some(problem),
        }
    }
}

/// Run `request` through content negotiation and `gate`
pub async fn run_evaluate(gate: &Arc<ContentValidationGate>, request: EvaluateRequest) -> Evaluation {
    let EvaluateRequest {
        handler,
        method,
        path,
        body,
    } = request;

    let mut pipeline = Pipeline::new();
    pipeline.attach(
        Arc::new(FnStage::new("content-negotiation", move |event: &mut RequestEvent| {
            event.set_parameter_data(ParameterData::new(body.clone()));
            None
        })),
        priority::CONTENT_NEGOTIATION,
    );
    gate.attach(&mut pipeline);
    debug!(stages = ?pipeline.stage_names(), "Evaluating request");

    let mut event = RequestEvent::new(method, path).with_route_match(RouteMatch::for_handler(handler));
    match pipeline.dispatch(&mut event).await {
        Some(problem) => Evaluation::Rejected(problem),
        None => Evaluation::Passed(event.validated_input()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::ServiceManager;
    use crate::validators::InputFilterFactory;
    use serde_json::json;

    const CONFIG: &str = r#"
[content_validation.Foo]
input_filter = "FooValidator"

[content_validation.Ghost]
input_filter = "GhostValidator"

[input_filter_specs.FooValidator.foo]
filters = [{ name = "string_trim" }]
validators = [{ name = "digits" }]

[input_filter_specs.FooValidator.bar]
validators = [{ name = "alpha" }]
"#;

    fn gate() -> Arc<ContentValidationGate> {
        let config: Config = CONFIG.parse().unwrap();
        Arc::new(
            config
                .into_gate(InputFilterFactory::new(), ServiceManager::new())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_valid_request_passes_with_filtered_values() {
        let request = EvaluateRequest::new(Method::POST, "Foo")
            .with_path("/foo")
            .with_body(json!({ "foo": " 42 ", "bar": "abc" }));

        match run_evaluate(&gate(), request).await {
            Evaluation::Passed(Some(validated)) => {
                assert_eq!(validated.name(), "FooValidator");
                assert_eq!(validated.value("foo"), Some(&json!("42")));
            }
            other => panic!("expected a validated pass, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected() {
        let request =
            EvaluateRequest::new(Method::PUT, "Foo").with_body(json!({ "foo": "abc", "bar": 123 }));

        let evaluation = run_evaluate(&gate(), request).await;
        let problem = evaluation.problem().unwrap();
        assert_eq!(problem.status, 422);
        assert_eq!(problem.validation_messages.as_ref().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_body_and_unknown_filter() {
        let gate = gate();

        let empty = run_evaluate(&gate, EvaluateRequest::new(Method::POST, "Foo")).await;
        assert_eq!(empty.problem().map(|p| p.status), Some(422));

        let ghost = run_evaluate(&gate, EvaluateRequest::new(Method::POST, "Ghost")).await;
        assert_eq!(ghost.problem().map(|p| p.status), Some(500));
    }

    #[tokio::test]
    async fn test_unvalidated_requests_pass_without_input() {
        let gate = gate();

        let get = run_evaluate(&gate, EvaluateRequest::new(Method::GET, "Foo")).await;
        assert!(matches!(get, Evaluation::Passed(None)));

        let other = EvaluateRequest::new(Method::POST, "Bar").with_body(json!({ "x": 1 }));
        assert!(run_evaluate(&gate, other).await.is_pass());
    }
}
