//! Origin to factory bindings: where module code comes from

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;
use crate::core::module::{Module, ModuleBuildInfo, ModuleFactory, Origin};
use crate::error::{AugurError, Result};

/// Maps each origin to the factory that builds its descriptor.
///
/// Replacing the factory bound to an origin and then reloading it is how
/// new module code is swapped in at runtime.
#[derive(Default)]
pub struct ModuleCatalog {
    factories: RwLock<IndexMap<Origin, Arc<dyn ModuleFactory>>>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded with every module submitted through `module_init!`.
    pub fn with_registered() -> Self {
        let catalog = Self::new();
        catalog.add_registered();
        catalog
    }

    /// Bind every `module_init!` submission not already bound.
    pub fn add_registered(&self) -> usize {
        let mut factories = self.factories.write();
        let mut added = 0;
        for info in inventory::iter::<ModuleBuildInfo> {
            let origin = Origin::new(info.origin);
            if factories.contains_key(&origin) {
                continue;
            }
            tracing::debug!(origin = %origin, "discovered module");
            factories.insert(origin, Arc::new(info.construct_fn));
            added += 1;
        }
        added
    }

    /// Bind a constructor to `origin`, returning the factory it replaced.
    pub fn insert<F>(&self, origin: impl Into<Origin>, construct: F) -> Option<Arc<dyn ModuleFactory>>
    where
        F: Fn() -> Result<Module> + Send + Sync + 'static,
    {
        self.insert_factory(origin, Arc::new(construct))
    }

    pub fn insert_factory(&self, origin: impl Into<Origin>, factory: Arc<dyn ModuleFactory>) -> Option<Arc<dyn ModuleFactory>> {
        self.factories.write().insert(origin.into(), factory)
    }

    pub fn remove(&self, origin: &Origin) -> Option<Arc<dyn ModuleFactory>> {
        self.factories.write().shift_remove(origin)
    }

    pub fn contains(&self, origin: &Origin) -> bool {
        self.factories.read().contains_key(origin)
    }

    /// Origins in binding order.
    pub fn origins(&self) -> Vec<Origin> {
        self.factories.read().keys().cloned().collect()
    }

    /// Build a fresh descriptor for `origin`.
    pub fn create(&self, origin: &Origin) -> Result<Module> {
        let factory = self
            .factories
            .read()
            .get(origin)
            .cloned()
            .ok_or_else(|| AugurError::ModuleNotFound(origin.to_string()))?;
        factory.create()
    }

    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
