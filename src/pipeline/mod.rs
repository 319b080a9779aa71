//! Request pipeline
//!
//! Stages are attached with a priority and run from highest to lowest
//! priority; stages with equal priority run in attach order. A stage that
//! returns a problem short-circuits the pipeline and the request never
//! reaches its handler.
//!
//! # Stage order
//!
//! ```text
//! routing
//!   └─> AUTHENTICATION       (-50)
//!   └─> AUTHORIZATION        (-600)
//!   └─> CONTENT_NEGOTIATION  (-625)  publishes ParameterData
//!   └─> CONTENT_VALIDATION   (-650)  the content validation gate
//! handler
//! ```

pub mod event;

pub use event::{EventParams, ParameterData, RequestEvent, RouteMatch, PARAMETER_DATA_PARAM};

use crate::problem::ApiProblem;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Well-known stage priorities
pub mod priority {
    pub const AUTHENTICATION: i32 = -50;
    pub const AUTHORIZATION: i32 = -600;
    pub const CONTENT_NEGOTIATION: i32 = -625;
    pub const CONTENT_VALIDATION: i32 = -650;
}

/// A step of request processing that runs before the handler
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name (for logging and debugging)
    fn name(&self) -> &str;

    /// Handle the request
    ///
    /// # Returns
    /// * `None` - continue with the next stage
    /// * `Some(ApiProblem)` - abort the request with this problem
    async fn handle(&self, event: &mut RequestEvent) -> Option<ApiProblem>;
}

/// Stage backed by a closure
pub struct FnStage<F> {
    name: String,
    handler: F,
}

impl<F> FnStage<F>
where
    F: Fn(&mut RequestEvent) -> Option<ApiProblem> + Send + Sync,
{
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&mut RequestEvent) -> Option<ApiProblem> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &mut RequestEvent) -> Option<ApiProblem> {
        (self.handler)(event)
    }
}

/// Handle returned by [`Pipeline::attach`], used to detach the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageId(u64);

struct Attached {
    id: StageId,
    priority: i32,
    stage: Arc<dyn Stage>,
}

/// Ordered list of stages
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Attached>,
    next_id: u64,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a stage at `priority`
    pub fn attach(&mut self, stage: Arc<dyn Stage>, priority: i32) -> StageId {
        let id = StageId(self.next_id);
        self.next_id += 1;

        debug!(stage = stage.name(), priority, "Attaching stage");
        let position = self
            .stages
            .iter()
            .position(|s| s.priority < priority)
            .unwrap_or(self.stages.len());
        self.stages.insert(
            position,
            Attached {
                id,
                priority,
                stage,
            },
        );
        id
    }

    /// Detach a previously attached stage
    ///
    /// Returns false if the stage was not attached.
    pub fn detach(&mut self, id: StageId) -> bool {
        let before = self.stages.len();
        self.stages.retain(|s| s.id != id);
        before != self.stages.len()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.stage.name()).collect()
    }

    /// Priority of an attached stage
    pub fn priority_of(&self, id: StageId) -> Option<i32> {
        self.stages.iter().find(|s| s.id == id).map(|s| s.priority)
    }

    /// Run the stages in order until one returns a problem
    pub async fn dispatch(&self, event: &mut RequestEvent) -> Option<ApiProblem> {
        for attached in &self.stages {
            if let Some(problem) = attached.stage.handle(event).await {
                info!(
                    stage = attached.stage.name(),
                    status = problem.status,
                    method = %event.method(),
                    path = event.path(),
                    "🚫 Request stopped by stage"
                );
                return Some(problem);
            }
        }
        None
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<_> = self
            .stages
            .iter()
            .map(|s| (s.stage.name(), s.priority))
            .collect();
        f.debug_struct("Pipeline").field("stages", &stages).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use parking_lot::Mutex;

    fn recording(name: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Arc<dyn Stage> {
        Arc::new(FnStage::new(name, move |_event: &mut RequestEvent| {
            log.lock().push(name);
            None
        }))
    }

    #[tokio::test]
    async fn test_stages_run_by_descending_priority() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.attach(recording("validation", log.clone()), priority::CONTENT_VALIDATION);
        pipeline.attach(recording("auth", log.clone()), priority::AUTHENTICATION);
        pipeline.attach(recording("negotiation", log.clone()), priority::CONTENT_NEGOTIATION);
        pipeline.attach(recording("negotiation-2", log.clone()), priority::CONTENT_NEGOTIATION);

        let mut event = RequestEvent::new(Method::POST, "/");
        assert!(pipeline.dispatch(&mut event).await.is_none());
        assert_eq!(
            *log.lock(),
            vec!["auth", "negotiation", "negotiation-2", "validation"]
        );
        assert_eq!(
            pipeline.stage_names(),
            vec!["auth", "negotiation", "negotiation-2", "validation"]
        );
    }

    #[tokio::test]
    async fn test_problem_short_circuits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.attach(
            Arc::new(FnStage::new("deny", |_event: &mut RequestEvent| {
                Some(ApiProblem::new(StatusCode::FORBIDDEN, "nope"))
            })),
            0,
        );
        pipeline.attach(recording("later", log.clone()), -10);

        let mut event = RequestEvent::new(Method::POST, "/");
        let problem = pipeline.dispatch(&mut event).await.unwrap();
        assert_eq!(problem.status, 403);
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_detach_by_id() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        let first = pipeline.attach(recording("first", log.clone()), 0);
        pipeline.attach(recording("second", log.clone()), 0);

        assert_eq!(pipeline.priority_of(first), Some(0));
        assert!(pipeline.detach(first));
        assert!(!pipeline.detach(first));
        assert_eq!(pipeline.len(), 1);

        let mut event = RequestEvent::new(Method::POST, "/");
        pipeline.dispatch(&mut event).await;
        assert_eq!(*log.lock(), vec!["second"]);
    }
}
