//! Request event - the per-request data passed through the pipeline

use http::Method;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Parameter key under which content negotiation publishes [`ParameterData`]
pub const PARAMETER_DATA_PARAM: &str = "content_negotiation.parameter_data";

/// Result of routing: the matched handler and route parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Route parameter naming the resolved handler
    pub const HANDLER: &'static str = "handler";

    pub fn new() -> Self {
        Self::default()
    }

    /// Route match that resolved to `handler`
    pub fn for_handler(handler: impl Into<String>) -> Self {
        Self::new().with_param(Self::HANDLER, handler)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Resolved handler identifier, if any (empty counts as none)
    pub fn handler(&self) -> Option<&str> {
        self.param(Self::HANDLER).filter(|h| !h.is_empty())
    }
}

/// Parsed request parameters produced by content negotiation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterData {
    body: Value,
}

impl ParameterData {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// Body parameters as parsed (may be null, a string, or a mapping)
    pub fn body_params(&self) -> &Value {
        &self.body
    }
}

/// Key-value store shared by the stages handling one request
#[derive(Default)]
pub struct EventParams {
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl EventParams {
    /// Set a value, replacing any previous value under `key`
    pub fn set<T: Any + Send + Sync>(&mut self, key: &str, value: T) {
        self.values.insert(key.to_string(), Arc::new(value));
    }

    /// Get a value if present and of type `T`
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = Arc::clone(self.values.get(key)?);
        value.downcast::<T>().ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }
}

impl fmt::Debug for EventParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("EventParams").field("keys", &keys).finish()
    }
}

/// An inbound request as seen by pipeline stages
#[derive(Debug)]
pub struct RequestEvent {
    /// HTTP method
    method: Method,

    /// Request path
    path: String,

    /// Routing result, once routing has run
    route_match: Option<RouteMatch>,

    /// Values published by earlier stages
    params: EventParams,
}

impl RequestEvent {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            route_match: None,
            params: EventParams::default(),
        }
    }

    pub fn with_route_match(mut self, route_match: RouteMatch) -> Self {
        self.route_match = Some(route_match);
        self
    }

    pub fn with_parameter_data(mut self, data: ParameterData) -> Self {
        self.set_parameter_data(data);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn route_match(&self) -> Option<&RouteMatch> {
        self.route_match.as_ref()
    }

    pub fn set_route_match(&mut self, route_match: RouteMatch) {
        self.route_match = Some(route_match);
    }

    /// Publish parsed request parameters
    pub fn set_parameter_data(&mut self, data: ParameterData) {
        self.params.set(PARAMETER_DATA_PARAM, data);
    }

    /// Parsed request parameters, if content negotiation ran
    pub fn parameter_data(&self) -> Option<Arc<ParameterData>> {
        self.params.get(PARAMETER_DATA_PARAM)
    }

    pub fn params(&self) -> &EventParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut EventParams {
        &mut self.params
    }
}
