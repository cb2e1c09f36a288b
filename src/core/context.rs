//! Context system for resource management

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use parking_lot::RwLock;
use crate::core::module::Origin;
use crate::core::platform::Platform;
use crate::core::report::{ErrorContext, LogReporter, Reporter};
use crate::error::{AugurError, Result};
use crate::runtime::config::ClientConfig;
use crate::runtime::manager::ModuleManager;

type ResourceFactory = Box<dyn Fn() -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// Shared state injected into every module routine.
#[derive(Clone)]
pub struct Context {
    resources: Arc<RwLock<ResourceRegistry>>,
    config: Arc<ClientConfig>,
    platform: Arc<dyn Platform>,
    reporter: Arc<dyn Reporter>,
    manager: Weak<ModuleManager>,
    origin: Option<Origin>,
}

impl Context {
    pub fn new(config: Arc<ClientConfig>, platform: Arc<dyn Platform>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            resources: Arc::new(RwLock::new(ResourceRegistry::new())),
            config,
            platform,
            reporter,
            manager: Weak::new(),
            origin: None,
        }
    }

    pub fn with_manager(self, manager: Weak<ModuleManager>) -> Self {
        Self { manager, ..self }
    }

    /// Same shared state, scoped to one module.
    pub fn with_module(&self, origin: Origin) -> Self {
        Self {
            origin: Some(origin),
            ..self.clone()
        }
    }

    pub fn insert<T: Send + Sync + 'static>(&self, resource: T) {
        self.resources.write().insert(resource);
    }

    pub fn insert_lazy<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        self.resources.write().insert_lazy(factory);
    }

    pub fn get<T: 'static + Send + Sync, R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        self.resource::<T>().map(|arc| f(&*arc))
    }

    pub fn resource<T: 'static + Send + Sync>(&self) -> Option<Arc<T>> {
        let mut registry = self.resources.write();
        registry.get::<T>()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.resources.read().contains::<T>()
    }

    pub fn remove<T: 'static + Send + Sync>(&self) -> Option<Arc<T>> {
        self.resources.write().remove::<T>()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    pub fn report(&self, error: &AugurError, context: &ErrorContext) {
        self.reporter.report(error, context);
    }

    /// The module manager this context belongs to, while it is alive.
    pub fn modules(&self) -> Option<Arc<ModuleManager>> {
        self.manager.upgrade()
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }
}

/// Type-safe DI container
pub struct ResourceRegistry {
    resources: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    lazy_factories: HashMap<TypeId, ResourceFactory>,
}

impl ResourceRegistry {
    fn new() -> Self {
        Self {
            resources: HashMap::new(),
            lazy_factories: HashMap::new(),
        }
    }

    fn insert<T: Send + Sync + 'static>(&mut self, resource: T) {
        let type_id = TypeId::of::<T>();
        self.lazy_factories.remove(&type_id);
        self.resources.insert(type_id, Arc::new(resource));
    }

    fn insert_lazy<T, F>(&mut self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<T>();
        let factory: ResourceFactory = Box::new(move || {
            let resource = factory()?;
            Ok(Box::new(resource))
        });

        self.resources.remove(&type_id);
        self.lazy_factories.insert(type_id, factory);
    }

    fn get<T: 'static + Send + Sync>(&mut self) -> Option<Arc<T>> {
        let type_id = TypeId::of::<T>();

        if self.lazy_factories.contains_key(&type_id) {
            if let Err(e) = self.initialize_lazy::<T>() {
                tracing::warn!(resource = std::any::type_name::<T>(), error = %e, "lazy resource failed to initialize");
                return None;
            }
        }

        self.resources
            .get(&type_id)
            .and_then(|arc| Arc::clone(arc).downcast::<T>().ok())
    }

    fn initialize_lazy<T: 'static + Send + Sync>(&mut self) -> Result<()> {
        let type_id = TypeId::of::<T>();

        let factory = self.lazy_factories.remove(&type_id).ok_or_else(|| {
            AugurError::Other(format!("Lazy factory not found for type: {}", std::any::type_name::<T>()))
        })?;
        let boxed_resource = factory()?;

        match boxed_resource.downcast::<T>() {
            Ok(resource) => {
                self.resources.insert(type_id, Arc::new(*resource));
                Ok(())
            }
            Err(_) => Err(AugurError::Other(format!(
                "Failed to downcast lazy initialized resource: {}",
                std::any::type_name::<T>()
            ))),
        }
    }

    fn contains<T: 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.resources.contains_key(&type_id) || self.lazy_factories.contains_key(&type_id)
    }

    fn remove<T: 'static + Send + Sync>(&mut self) -> Option<Arc<T>> {
        let type_id = TypeId::of::<T>();
        self.lazy_factories.remove(&type_id);
        self.resources
            .remove(&type_id)
            .and_then(|arc| arc.downcast::<T>().ok())
    }
}

pub struct ContextBuilder {
    config: Option<ClientConfig>,
    platform: Option<Arc<dyn Platform>>,
    reporter: Option<Arc<dyn Reporter>>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            platform: None,
            reporter: None,
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn build(self) -> Result<Context> {
        let platform = self.platform
            .ok_or_else(|| AugurError::Config("A platform is required".to_string()))?;
        let reporter = self.reporter.unwrap_or_else(|| Arc::new(LogReporter));

        Ok(Context::new(
            Arc::new(self.config.unwrap_or_default()),
            platform,
            reporter,
        ))
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
