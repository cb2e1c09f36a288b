//! Module descriptors and the factories that produce them

use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use crate::core::clockwork::ClockworkHandle;
use crate::core::command::Command;
use crate::core::context::Context;
use crate::core::event::{handler, EventContext, EventRoutine, Flow};
use crate::core::interaction::{InteractionCommand, InteractionHandler};
use crate::error::Result;

/// Stable identity of a loaded module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Origin(Arc<str>);

impl Origin {
    pub fn new(origin: impl AsRef<str>) -> Self {
        Self(Arc::from(origin.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Origin {
    fn from(origin: &str) -> Self {
        Self::new(origin)
    }
}

impl From<String> for Origin {
    fn from(origin: String) -> Self {
        Self(Arc::from(origin))
    }
}

/// State handed from an unloading module to its next incarnation.
pub type CarriedData = Box<dyn Any + Send + Sync>;

pub type InitRoutine = Box<dyn FnOnce(Context, Option<CarriedData>) -> BoxFuture<'static, Result<()>> + Send>;
pub type UnloadRoutine = Box<dyn FnOnce(Context) -> BoxFuture<'static, Result<Option<CarriedData>>> + Send>;
pub type ClockworkFactory = Box<dyn FnOnce(Context) -> Result<ClockworkHandle> + Send>;

/// Box a value for carrying across a reload.
pub fn carry<T: Any + Send + Sync>(value: T) -> Option<CarriedData> {
    Some(Box::new(value))
}

/// Take carried data back out as `T`, if that is what was carried.
pub fn take_carried<T: Any>(data: Option<CarriedData>) -> Option<T> {
    data.and_then(|data| data.downcast::<T>().ok()).map(|boxed| *boxed)
}

/// Everything a module contributes when it is loaded.
///
/// A descriptor is built fresh for every (re)load and consumed by registration.
/// Each member is optional.
#[derive(Default)]
pub struct Module {
    pub(crate) commands: Vec<Command>,
    pub(crate) interaction_commands: Vec<InteractionCommand>,
    pub(crate) interaction_handlers: Vec<InteractionHandler>,
    pub(crate) events: IndexMap<String, EventRoutine>,
    pub(crate) clockwork: Option<ClockworkFactory>,
    pub(crate) init: Option<InitRoutine>,
    pub(crate) unload: Option<UnloadRoutine>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    #[must_use]
    pub fn add_interaction_command(mut self, command: InteractionCommand) -> Self {
        self.interaction_commands.push(command);
        self
    }

    #[must_use]
    pub fn add_interaction_handler(mut self, handler: InteractionHandler) -> Self {
        self.interaction_handlers.push(handler);
        self
    }

    /// Subscribe to an event by name. A second subscription to the same name replaces the first.
    #[must_use]
    pub fn add_event<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(EventContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow>> + Send + 'static,
    {
        self.add_event_routine(name, handler(f))
    }

    #[must_use]
    pub fn add_event_routine(mut self, name: impl Into<String>, routine: EventRoutine) -> Self {
        self.events.insert(name.into(), routine);
        self
    }

    #[must_use]
    pub fn set_clockwork<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(Context) -> Result<ClockworkHandle> + Send + 'static,
    {
        self.clockwork = Some(Box::new(factory));
        self
    }

    /// Shorthand for a clockwork that calls `tick` every `period`.
    #[must_use]
    pub fn every<F, Fut>(self, period: Duration, tick: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.set_clockwork(move |ctx| ClockworkHandle::interval(ctx, period, tick))
    }

    #[must_use]
    pub fn set_init<F, Fut>(mut self, init: F) -> Self
    where
        F: FnOnce(Context, Option<CarriedData>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.init = Some(Box::new(move |ctx, data| init(ctx, data).boxed()));
        self
    }

    #[must_use]
    pub fn set_unload<F, Fut>(mut self, unload: F) -> Self
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<CarriedData>>> + Send + 'static,
    {
        self.unload = Some(Box::new(move |ctx| unload(ctx).boxed()));
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    pub fn has_clockwork(&self) -> bool {
        self.clockwork.is_some()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("commands", &self.commands.len())
            .field("interaction_commands", &self.interaction_commands.len())
            .field("interaction_handlers", &self.interaction_handlers.len())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field("clockwork", &self.clockwork.is_some())
            .field("init", &self.init.is_some())
            .field("unload", &self.unload.is_some())
            .finish()
    }
}

/// Produces a fresh descriptor every time a module is (re)loaded.
pub trait ModuleFactory: Send + Sync {
    fn create(&self) -> Result<Module>;
}

impl<F> ModuleFactory for F
where
    F: Fn() -> Result<Module> + Send + Sync,
{
    fn create(&self) -> Result<Module> {
        self()
    }
}

/// Compile-time registration record collected by `inventory`.
#[derive(Clone, Copy)]
pub struct ModuleBuildInfo {
    pub origin: &'static str,
    pub construct_fn: fn() -> Result<Module>,
}

impl ModuleBuildInfo {
    pub const fn new(origin: &'static str, construct_fn: fn() -> Result<Module>) -> Self {
        Self { origin, construct_fn }
    }
}

inventory::collect!(ModuleBuildInfo);

/// Register a module constructor under an origin at compile time.
///
/// ```ignore
/// fn fun_module() -> augur::Result<augur::core::Module> { /* ... */ }
/// augur::module_init!("modules/fun", fun_module);
/// ```
#[macro_export]
macro_rules! module_init {
    ($origin:expr, $construct:path) => {
        $crate::inventory::submit! {
            $crate::core::module::ModuleBuildInfo::new($origin, $construct)
        }
    };
}
