//! Input filter registry - resolves and caches validators by name

use super::InputFilter;
use crate::error::RegistryError;
use crate::services::ServiceLocator;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Registry of resolved input filters
///
/// A name resolves when the service locator can produce a service that is an
/// input filter. Resolved instances are cached for the lifetime of the
/// registry and never evicted; the set of named validators is static for the
/// process.
pub struct InputFilterRegistry {
    /// Lookup collaborator (absent means nothing resolves beyond the cache)
    services: Option<Arc<dyn ServiceLocator>>,

    /// Resolved input filters by name
    cache: RwLock<HashMap<String, Arc<dyn InputFilter>>>,
}

impl InputFilterRegistry {
    /// Create a registry backed by a service locator
    pub fn new(services: Arc<dyn ServiceLocator>) -> Self {
        Self {
            services: Some(services),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with no service locator
    pub fn detached() -> Self {
        Self {
            services: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Check if `name` resolves to an input filter, caching it if so
    pub fn has(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Get a previously resolved input filter
    ///
    /// Only names that [`has`](Self::has) accepted are available.
    pub fn get(&self, name: &str) -> Result<Arc<dyn InputFilter>, RegistryError> {
        self.cache
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Resolve `name`, consulting the cache first
    ///
    /// When two callers race on the same name, the first insert wins and
    /// both receive that instance.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn InputFilter>> {
        if let Some(filter) = self.cache.read().get(name) {
            return Some(Arc::clone(filter));
        }

        let filter = self.lookup(name)?;
        let mut cache = self.cache.write();
        let cached = cache.entry(name.to_string()).or_insert(filter);
        Some(Arc::clone(cached))
    }

    /// Register a live input filter directly
    pub fn insert(&self, name: &str, filter: Arc<dyn InputFilter>) {
        debug!(input_filter = name, "Registering input filter");
        self.cache.write().insert(name.to_string(), filter);
    }

    /// Names resolved so far
    pub fn resolved_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cache.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn lookup(&self, name: &str) -> Option<Arc<dyn InputFilter>> {
        let services = self.services.as_ref()?;
        if !services.has(name) {
            debug!(input_filter = name, "No service registered");
            return None;
        }

        let service = match services.get(name) {
            Ok(service) => service,
            Err(e) => {
                error!(input_filter = name, error = %e, "❌ Failed to resolve input filter service");
                return None;
            }
        };

        let filter = service.as_input_filter();
        if filter.is_none() {
            warn!(input_filter = name, "Service exists but is not an input filter");
        }
        filter
    }
}

impl fmt::Debug for InputFilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFilterRegistry")
            .field("resolved", &self.resolved_names())
            .field("services", &self.services.is_some())
            .finish()
    }
}
