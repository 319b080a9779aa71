//! Structured failure payloads returned when a request is rejected.
//!
//! An [`ApiProblem`] serializes to the `application/problem+json` shape that
//! API clients expect: `type`, `title`, `status`, `detail`, plus the optional
//! `validation_messages` map for rule failures.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Content type to send with a serialized problem
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Problem type URI used when no more specific type applies
pub const DEFAULT_PROBLEM_TYPE: &str = "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html";

/// Field name -> ordered list of messages for that field
pub type ValidationMessages = BTreeMap<String, Vec<String>>;

/// Problem details object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiProblem {
    /// Problem type URI
    #[serde(rename = "type")]
    pub problem_type: String,

    /// Short summary derived from the status code
    pub title: String,

    /// HTTP status code
    pub status: u16,

    /// Human-readable explanation of this occurrence
    pub detail: String,

    /// Per-field messages, only present for failed validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_messages: Option<ValidationMessages>,
}

impl ApiProblem {
    /// Create a problem for the given status and detail
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            problem_type: DEFAULT_PROBLEM_TYPE.to_string(),
            title: status.canonical_reason().unwrap_or("Unknown").to_string(),
            status: status.as_u16(),
            detail: detail.into(),
            validation_messages: None,
        }
    }

    /// Attach per-field validation messages
    pub fn with_validation_messages(mut self, messages: ValidationMessages) -> Self {
        self.validation_messages = Some(messages);
        self
    }

    /// Status as a typed status code
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Serialize to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        // Serializing plain strings and maps cannot fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for ApiProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status, self.title, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_title_follows_status() {
        let problem = ApiProblem::new(StatusCode::UNPROCESSABLE_ENTITY, "Failed Validation");
        assert_eq!(problem.status, 422);
        assert_eq!(problem.title, "Unprocessable Entity");
        assert_eq!(problem.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_problem_serialization_omits_missing_messages() {
        let problem = ApiProblem::new(StatusCode::BAD_REQUEST, "Unrecognized field \"baz\"");
        let json = problem.to_json();

        assert_eq!(json["type"], DEFAULT_PROBLEM_TYPE);
        assert_eq!(json["status"], 400);
        assert_eq!(json["detail"], "Unrecognized field \"baz\"");
        assert!(json.get("validation_messages").is_none());
    }

    #[test]
    fn test_problem_serialization_with_messages() {
        let mut messages = ValidationMessages::new();
        messages.insert("foo".to_string(), vec!["The input must contain only digits".to_string()]);

        let problem = ApiProblem::new(StatusCode::UNPROCESSABLE_ENTITY, "Failed Validation")
            .with_validation_messages(messages);
        let json = problem.to_json();

        assert_eq!(
            json["validation_messages"]["foo"][0],
            "The input must contain only digits"
        );

        let round: ApiProblem = serde_json::from_value(json).unwrap();
        assert_eq!(round, problem);
    }
}
