//! Service lookup
//!
//! The gate never constructs validators itself; it asks a [`ServiceLocator`]
//! for a service by name and checks whether that service can act as an
//! input filter. [`ServiceManager`] is the in-memory locator: live services
//! registered by name, plus abstract factories that create services on
//! demand (for example [`InputFilterAbstractFactory`], which builds input
//! filters from declarative specs).

use crate::error::ServiceError;
use crate::validators::{FieldSetFilter, InputFilter, InputFilterFactory, InputFilterSpec};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Anything a locator can hand out
///
/// Services advertise their capabilities through the `as_*` methods; the
/// defaults report no capability.
pub trait Service: Send + Sync + 'static {
    /// View this service as an input filter, if it is one
    fn as_input_filter(self: Arc<Self>) -> Option<Arc<dyn InputFilter>> {
        None
    }
}

impl Service for FieldSetFilter {
    fn as_input_filter(self: Arc<Self>) -> Option<Arc<dyn InputFilter>> {
        Some(self)
    }
}

/// Name-based service lookup
pub trait ServiceLocator: Send + Sync {
    /// Check if a service exists or can be created
    fn has(&self, name: &str) -> bool;

    /// Retrieve (creating if needed) a service
    fn get(&self, name: &str) -> Result<Arc<dyn Service>, ServiceError>;
}

/// Creates services whose names it recognizes
pub trait AbstractFactory: Send + Sync {
    fn can_create(&self, name: &str) -> bool;

    fn create(&self, name: &str) -> Result<Arc<dyn Service>, ServiceError>;
}

/// In-memory service locator
///
/// Services created through an abstract factory are shared: the first
/// successful creation is stored and returned for every later lookup.
#[derive(Default)]
pub struct ServiceManager {
    services: RwLock<HashMap<String, Arc<dyn Service>>>,
    abstract_factories: Vec<Arc<dyn AbstractFactory>>,
}

impl ServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live service
    pub fn set_service(&self, name: &str, service: Arc<dyn Service>) {
        debug!(service = name, "Registering service");
        self.services.write().insert(name.to_string(), service);
    }

    /// Add an abstract factory, consulted in registration order
    pub fn add_abstract_factory(&mut self, factory: Arc<dyn AbstractFactory>) {
        self.abstract_factories.push(factory);
    }

    fn factory_for(&self, name: &str) -> Option<&Arc<dyn AbstractFactory>> {
        self.abstract_factories.iter().find(|f| f.can_create(name))
    }
}

impl ServiceLocator for ServiceManager {
    fn has(&self, name: &str) -> bool {
        self.services.read().contains_key(name) || self.factory_for(name).is_some()
    }

    fn get(&self, name: &str) -> Result<Arc<dyn Service>, ServiceError> {
        if let Some(service) = self.services.read().get(name) {
            return Ok(Arc::clone(service));
        }

        let factory = self
            .factory_for(name)
            .ok_or_else(|| ServiceError::NotFound(name.to_string()))?;

        let created = factory.create(name)?;
        let mut services = self.services.write();
        let shared = services
            .entry(name.to_string())
            .or_insert_with(|| created);
        Ok(Arc::clone(shared))
    }
}

impl fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.services.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("ServiceManager")
            .field("services", &names)
            .field("abstract_factories", &self.abstract_factories.len())
            .finish()
    }
}

/// Builds input filters from the configured `input_filter_specs`
#[derive(Debug)]
pub struct InputFilterAbstractFactory {
    specs: BTreeMap<String, InputFilterSpec>,
    factory: InputFilterFactory,
}

impl InputFilterAbstractFactory {
    pub fn new(specs: BTreeMap<String, InputFilterSpec>, factory: InputFilterFactory) -> Self {
        info!("🔧 Input filter specs available: {}", specs.len());
        Self { specs, factory }
    }
}

impl AbstractFactory for InputFilterAbstractFactory {
    fn can_create(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    fn create(&self, name: &str) -> Result<Arc<dyn Service>, ServiceError> {
        let spec = self
            .specs
            .get(name)
            .ok_or_else(|| ServiceError::NotFound(name.to_string()))?;

        match self.factory.build(spec) {
            Ok(filter) => {
                debug!(input_filter = name, inputs = filter.len(), "Created input filter from spec");
                Ok(Arc::new(filter))
            }
            Err(source) => {
                error!(input_filter = name, error = %source, "❌ Failed to build input filter");
                Err(ServiceError::Creation {
                    name: name.to_string(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{InputSpec, RuleSpec};

    struct Mailer;

    impl Service for Mailer {}

    fn specs() -> BTreeMap<String, InputFilterSpec> {
        let mut spec = InputFilterSpec::new();
        spec.insert(
            "foo".to_string(),
            InputSpec {
                validators: vec![RuleSpec::new("digits")],
                ..Default::default()
            },
        );

        let mut broken = InputFilterSpec::new();
        broken.insert(
            "foo".to_string(),
            InputSpec {
                validators: vec![RuleSpec::new("nope")],
                ..Default::default()
            },
        );

        let mut specs = BTreeMap::new();
        specs.insert("FooValidator".to_string(), spec);
        specs.insert("Broken".to_string(), broken);
        specs
    }

    fn manager() -> ServiceManager {
        let mut services = ServiceManager::new();
        services.add_abstract_factory(Arc::new(InputFilterAbstractFactory::new(
            specs(),
            InputFilterFactory::new(),
        )));
        services
    }

    #[test]
    fn test_live_service_lookup() {
        let services = ServiceManager::new();
        services.set_service("Mailer", Arc::new(Mailer));

        assert!(services.has("Mailer"));
        assert!(!services.has("Other"));
        assert!(services.get("Mailer").unwrap().as_input_filter().is_none());
        assert!(matches!(services.get("Other"), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_abstract_factory_creates_shared_instance() {
        let services = manager();
        assert!(services.has("FooValidator"));

        let first = services.get("FooValidator").unwrap();
        let second = services.get("FooValidator").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.as_input_filter().is_some());
    }

    #[test]
    fn test_abstract_factory_build_failure() {
        let services = manager();
        assert!(services.has("Broken"));
        assert!(matches!(
            services.get("Broken"),
            Err(ServiceError::Creation { .. })
        ));
    }
}
