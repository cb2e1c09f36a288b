//! Module manager: register, unload and reload modules against the registries

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use crate::core::context::Context;
use crate::core::interaction::{InteractionCommand, InteractionHandler};
use crate::core::module::{CarriedData, Module, Origin, UnloadRoutine};
use crate::core::report::{ErrorContext, LifecycleOp};
use crate::error::{AugurError, Result, ResultExt};
use crate::registry::{ClockworkRegistry, CommandRegistry, EventRegistry, InteractionRegistry};
use crate::runtime::catalog::ModuleCatalog;

/// Lifecycle state of a known origin. Absent means unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Registering,
    Active,
    Unloading,
    Reloading,
}

struct PendingInteractions {
    origin: Origin,
    commands: Vec<InteractionCommand>,
    handlers: Vec<InteractionHandler>,
}

/// Owns the four registries and threads module state across reloads.
///
/// At most one lifecycle operation runs per origin at a time.
pub struct ModuleManager {
    commands: CommandRegistry,
    events: EventRegistry,
    interactions: InteractionRegistry,
    clockwork: ClockworkRegistry,
    catalog: Arc<ModuleCatalog>,
    ctx: Context,
    states: RwLock<HashMap<Origin, ModuleState>>,
    unloads: Mutex<HashMap<Origin, UnloadRoutine>>,
    pending: Mutex<Vec<PendingInteractions>>,
    ready: AtomicBool,
    locks: Mutex<HashMap<Origin, Arc<tokio::sync::Mutex<()>>>>,
}

impl ModuleManager {
    /// The manager hands every routine a context that points back at itself.
    pub fn new(ctx: Context, catalog: Arc<ModuleCatalog>) -> Arc<Self> {
        let ready = ctx.platform().is_ready();
        Arc::new_cyclic(|manager| Self {
            commands: CommandRegistry::new(),
            events: EventRegistry::new(),
            interactions: InteractionRegistry::new(),
            clockwork: ClockworkRegistry::new(),
            catalog,
            ctx: ctx.with_manager(manager.clone()),
            states: RwLock::new(HashMap::new()),
            unloads: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
            ready: AtomicBool::new(ready),
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    pub fn interactions(&self) -> &InteractionRegistry {
        &self.interactions
    }

    pub fn clockwork(&self) -> &ClockworkRegistry {
        &self.clockwork
    }

    pub fn catalog(&self) -> &Arc<ModuleCatalog> {
        &self.catalog
    }

    /// Unscoped context shared by every module.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn state(&self, origin: &Origin) -> Option<ModuleState> {
        self.states.read().get(origin).copied()
    }

    pub fn is_active(&self, origin: &Origin) -> bool {
        self.state(origin) == Some(ModuleState::Active)
    }

    pub fn active_origins(&self) -> Vec<Origin> {
        let mut origins: Vec<_> = self
            .states
            .read()
            .iter()
            .filter(|(_, state)| **state == ModuleState::Active)
            .map(|(origin, _)| origin.clone())
            .collect();
        origins.sort();
        origins
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Origins whose interaction entries wait for the ready signal.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Bind a factory in the catalog and register it.
    pub async fn load<F>(&self, origin: impl Into<Origin>, factory: F) -> Result<()>
    where
        F: Fn() -> Result<Module> + Send + Sync + 'static,
    {
        let origin = origin.into();
        self.catalog.insert(origin.clone(), factory);
        self.register(&origin, None).await
    }

    /// Build a fresh descriptor for `origin` and install it.
    ///
    /// Failure is reported, whatever was installed is stripped again, and the
    /// error is returned. Other modules are unaffected.
    pub async fn register(&self, origin: &Origin, carried: Option<CarriedData>) -> Result<()> {
        let lock = self.origin_lock(origin);
        let _guard = lock.lock().await;
        self.register_locked(origin, carried, LifecycleOp::Register).await
    }

    /// Tear down `origin` and return whatever its unload routine handed back.
    /// Unloading an origin that is not active does nothing.
    pub async fn unload(&self, origin: &Origin) -> Option<CarriedData> {
        let lock = self.origin_lock(origin);
        let _guard = lock.lock().await;
        self.unload_locked(origin, LifecycleOp::Unload).await
    }

    /// Unload then register `origin`, carrying the unload result into init.
    pub async fn reload(&self, origin: &Origin) -> Result<()> {
        let lock = self.origin_lock(origin);
        let _guard = lock.lock().await;
        tracing::info!(origin = %origin, "reloading module");
        let carried = self.unload_locked(origin, LifecycleOp::Reload).await;
        self.set_state(origin, ModuleState::Reloading);
        self.register_locked(origin, carried, LifecycleOp::Reload).await
    }

    /// Register each origin in turn. Returns how many became active.
    pub async fn register_all<I>(&self, origins: I) -> usize
    where
        I: IntoIterator<Item = Origin>,
    {
        let mut registered = 0;
        for origin in origins {
            if self.register(&origin, None).await.is_ok() {
                registered += 1;
            }
        }
        registered
    }

    /// Shut everything down: clockwork, events, unload routines, then the
    /// command and interaction tables. Unload failures are reported and skipped.
    pub async fn unload_all(&self) -> usize {
        self.clockwork.clear();
        self.events.clear();
        self.pending.lock().clear();

        let unloads: Vec<(Origin, UnloadRoutine)> = self.unloads.lock().drain().collect();
        let count = unloads.len();
        for (origin, unload) in unloads {
            let lock = self.origin_lock(&origin);
            let _guard = lock.lock().await;
            self.set_state(&origin, ModuleState::Unloading);
            if let Err(e) = unload(self.ctx.with_module(origin.clone())).await.with_module(origin.as_str()) {
                self.ctx.report(
                    &e,
                    &ErrorContext::Lifecycle {
                        origin: origin.clone(),
                        op: LifecycleOp::UnloadAll,
                    },
                );
            }
        }

        self.commands.clear();
        self.interactions.clear();
        self.states.write().clear();
        tracing::info!(unload_routines = count, "all modules unloaded");
        count
    }

    /// Signal that the platform connection is ready and flush deferred
    /// interaction registrations. Only the first call does anything.
    pub async fn mark_ready(&self) -> usize {
        let batch = {
            let mut pending = self.pending.lock();
            if self.ready.swap(true, Ordering::SeqCst) {
                return 0;
            }
            std::mem::take(&mut *pending)
        };

        let mut installed = 0;
        for entry in batch {
            let lock = self.origin_lock(&entry.origin);
            let _guard = lock.lock().await;
            if !self.is_active(&entry.origin) {
                continue;
            }
            installed += self
                .interactions
                .register(&self.ctx, &entry.origin, entry.commands, entry.handlers)
                .await;
        }
        tracing::debug!(installed, "deferred interactions registered");
        installed
    }

    fn origin_lock(&self, origin: &Origin) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.locks.lock().entry(origin.clone()).or_default())
    }

    fn set_state(&self, origin: &Origin, state: ModuleState) {
        self.states.write().insert(origin.clone(), state);
    }

    async fn register_locked(&self, origin: &Origin, carried: Option<CarriedData>, op: LifecycleOp) -> Result<()> {
        match self.state(origin) {
            Some(ModuleState::Active) => {
                let e = AugurError::Registration(format!("{} is already registered", origin));
                self.ctx.report(&e, &ErrorContext::Lifecycle { origin: origin.clone(), op });
                return Err(e);
            }
            Some(ModuleState::Reloading) => {}
            _ => self.set_state(origin, ModuleState::Registering),
        }

        match self.install(origin, carried).await {
            Ok(()) => {
                self.set_state(origin, ModuleState::Active);
                tracing::info!(origin = %origin, op = %op, "module active");
                Ok(())
            }
            Err(e) => {
                self.strip(origin);
                self.unloads.lock().remove(origin);
                self.states.write().remove(origin);
                self.ctx.report(&e, &ErrorContext::Lifecycle { origin: origin.clone(), op });
                Err(e)
            }
        }
    }

    async fn install(&self, origin: &Origin, carried: Option<CarriedData>) -> Result<()> {
        let Module {
            commands,
            interaction_commands,
            interaction_handlers,
            events,
            clockwork,
            init,
            unload,
        } = self.catalog.create(origin)?;
        let interaction_handlers = interaction_handlers
            .into_iter()
            .map(InteractionHandler::validate)
            .collect::<Result<Vec<_>>>()
            .with_module(origin.as_str())?;

        let scoped = self.ctx.with_module(origin.clone());

        let named = self.commands.register(origin, commands);
        self.events.register(origin, events);
        if let Some(factory) = clockwork {
            let handle = factory(scoped.clone()).with_module(origin.as_str())?;
            self.clockwork.register(origin, handle);
        }
        tracing::debug!(origin = %origin, commands = named, "registered module contents");

        if !interaction_commands.is_empty() || !interaction_handlers.is_empty() {
            let entry = PendingInteractions {
                origin: origin.clone(),
                commands: interaction_commands,
                handlers: interaction_handlers,
            };
            let immediate = {
                let mut pending = self.pending.lock();
                if self.ready.load(Ordering::SeqCst) {
                    Some(entry)
                } else {
                    pending.push(entry);
                    None
                }
            };
            match immediate {
                Some(entry) => {
                    self.interactions
                        .register(&self.ctx, origin, entry.commands, entry.handlers)
                        .await;
                }
                None => tracing::debug!(origin = %origin, "platform not ready; deferring interactions"),
            }
        }

        if let Some(init) = init {
            init(scoped, carried).await.with_module(origin.as_str())?;
        }
        if let Some(unload) = unload {
            self.unloads.lock().insert(origin.clone(), unload);
        }
        Ok(())
    }

    async fn unload_locked(&self, origin: &Origin, op: LifecycleOp) -> Option<CarriedData> {
        if !self.is_active(origin) {
            tracing::debug!(origin = %origin, "unload of inactive module ignored");
            return None;
        }
        let transitional = if op == LifecycleOp::Reload {
            ModuleState::Reloading
        } else {
            ModuleState::Unloading
        };
        self.set_state(origin, transitional);

        self.clockwork.unload(origin);
        self.events.unload_origin(origin);
        self.interactions.unload_origin(origin);
        self.pending.lock().retain(|entry| &entry.origin != origin);

        let routine = self.unloads.lock().remove(origin);
        let carried = match routine {
            Some(unload) => match unload(self.ctx.with_module(origin.clone())).await.with_module(origin.as_str()) {
                Ok(data) => data,
                Err(e) => {
                    self.ctx.report(&e, &ErrorContext::Lifecycle { origin: origin.clone(), op });
                    None
                }
            },
            None => None,
        };

        self.commands.unload_origin(origin);
        if op != LifecycleOp::Reload {
            self.states.write().remove(origin);
        }
        tracing::info!(origin = %origin, op = %op, carried = carried.is_some(), "module unloaded");
        carried
    }

    /// Remove every trace of `origin` from the registries without running its
    /// unload routine.
    fn strip(&self, origin: &Origin) {
        self.clockwork.unload(origin);
        self.events.unload_origin(origin);
        self.interactions.unload_origin(origin);
        self.pending.lock().retain(|entry| &entry.origin != origin);
        self.commands.unload_origin(origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{Command, CommandContext, CommandInput, ParsedCommand};
    use crate::core::event::{ClientEvent, DispatchOutcome, Flow, Interaction, User};
    use crate::core::module::{carry, take_carried};
    use crate::testing::{message, test_context, MockPlatform, RecordingReporter};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize};
    use std::time::Duration;

    fn manager() -> (Arc<ModuleManager>, Arc<MockPlatform>, Arc<RecordingReporter>) {
        let (ctx, platform, reporter) = test_context();
        (ModuleManager::new(ctx, Arc::new(ModuleCatalog::new())), platform, reporter)
    }

    /// One command named `names[0]`, aliased by the rest.
    fn command_module(names: &'static [&'static str]) -> impl Fn() -> Result<Module> + Send + Sync {
        move || -> Result<Module> {
            let (name, aliases) = names.split_first().ok_or_else(|| AugurError::ModuleLoad("no command name".into()))?;
            let command = Command::builder(*name)
                .aliases(aliases.iter().copied())
                .process(|_, _| async { Ok(()) })
                .build()?;
            Ok(Module::new().add_command(command))
        }
    }

    #[tokio::test]
    async fn test_unload_unknown_origin_is_noop() {
        let (manager, _, reporter) = manager();
        assert!(manager.unload(&Origin::new("never")).await.is_none());
        assert!(manager.state(&Origin::new("never")).is_none());
        assert!(reporter.reports().is_empty());
    }

    #[tokio::test]
    async fn test_reload_carries_state() {
        let (manager, _, _) = manager();
        let counter = Arc::new(AtomicU32::new(0));

        let seen = Arc::clone(&counter);
        manager
            .load("modules/count", move || {
                let seen = Arc::clone(&seen);
                Ok(Module::new()
                    .set_init(move |_, data| async move {
                        if let Some(count) = take_carried::<u32>(data) {
                            seen.store(count, Ordering::SeqCst);
                        }
                        Ok(())
                    })
                    .set_unload(|_| async { Ok(carry(5u32)) }))
            })
            .await
            .unwrap();

        let origin = Origin::new("modules/count");
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        manager.reload(&origin).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert!(manager.is_active(&origin));
    }

    #[tokio::test]
    async fn test_register_twice_is_an_error() {
        let (manager, _, reporter) = manager();
        manager.load("modules/a", command_module(&["ping"])).await.unwrap();
        let err = manager.register(&Origin::new("modules/a"), None).await.unwrap_err();
        assert!(matches!(err, AugurError::Registration(_)));
        assert_eq!(reporter.reports().len(), 1);
        assert!(manager.commands().resolve("ping").is_some());
    }

    #[tokio::test]
    async fn test_failed_init_rolls_back() {
        let (manager, _, reporter) = manager();
        let result = manager
            .load("modules/broken", || {
                Ok(Module::new()
                    .add_command(Command::builder("half").process(|_, _| async { Ok(()) }).build()?)
                    .add_event("messageCreate", |_| async { Ok(Flow::Continue) })
                    .set_init(|_, _| async { Err(AugurError::Other("init exploded".into())) }))
            })
            .await;

        assert!(result.is_err());
        let origin = Origin::new("modules/broken");
        assert!(manager.state(&origin).is_none());
        assert!(manager.commands().resolve("half").is_none());
        assert!(!manager.events().is_subscribed(&origin));
        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].1, "Register: modules/broken");
    }

    #[tokio::test]
    async fn test_bad_descriptor_only_aborts_that_module() {
        let (manager, _, _) = manager();
        let bad = manager
            .load("modules/bad", || {
                Ok(Module::new().add_command(Command::builder("nameless").build()?))
            })
            .await;
        assert!(matches!(bad, Err(AugurError::ModuleLoad(_))));

        manager.load("modules/good", command_module(&["fine"])).await.unwrap();
        assert_eq!(manager.active_origins(), vec![Origin::new("modules/good")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unload_clears_every_registry() {
        let (manager, _, _) = manager();
        let ticks = Arc::new(AtomicUsize::new(0));
        let tick_counter = Arc::clone(&ticks);

        manager
            .load("modules/full", move || {
                let tick_counter = Arc::clone(&tick_counter);
                Ok(Module::new()
                    .add_command(Command::builder("full").alias("f").process(|_, _| async { Ok(()) }).build()?)
                    .add_event("messageCreate", |_| async { Ok(Flow::Continue) })
                    .add_interaction_handler(InteractionHandler::new("full-button", |_| async { Ok(()) }))
                    .every(Duration::from_secs(10), move |_| {
                        let tick_counter = Arc::clone(&tick_counter);
                        async move {
                            tick_counter.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }
                    }))
            })
            .await
            .unwrap();

        let origin = Origin::new("modules/full");
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        assert!(manager.clockwork().contains(&origin));
        assert!(manager.interactions().has_origin(&origin));

        manager.unload(&origin).await;
        assert!(manager.commands().resolve("full").is_none());
        assert!(manager.commands().resolve("f").is_none());
        assert!(!manager.events().is_subscribed(&origin));
        assert!(!manager.interactions().has_origin(&origin));
        assert!(!manager.clockwork().contains(&origin));
        assert!(manager.state(&origin).is_none());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_interactions_deferred_until_ready() {
        let (ctx, platform, _) = test_context();
        platform.clear_user();
        let manager = ModuleManager::new(ctx, Arc::new(ModuleCatalog::new()));
        assert!(!manager.is_ready());

        manager
            .load("modules/buttons", || {
                Ok(Module::new().add_interaction_handler(InteractionHandler::new("ok", |_| async { Ok(()) })))
            })
            .await
            .unwrap();
        manager
            .load("modules/gone", || {
                Ok(Module::new().add_interaction_handler(InteractionHandler::new("gone", |_| async { Ok(()) })))
            })
            .await
            .unwrap();

        assert_eq!(manager.pending_count(), 2);
        assert!(manager.interactions().resolve_handler("ok").is_none());
        manager.unload(&Origin::new("modules/gone")).await;
        assert_eq!(manager.pending_count(), 1);

        assert_eq!(manager.mark_ready().await, 1);
        assert!(manager.interactions().resolve_handler("ok").is_some());
        assert!(manager.interactions().resolve_handler("gone").is_none());
        assert_eq!(manager.mark_ready().await, 0);
    }

    #[tokio::test]
    async fn test_unload_all_runs_every_unload_routine() {
        let (manager, _, reporter) = manager();
        let unloaded = Arc::new(AtomicUsize::new(0));

        for name in ["modules/a", "modules/b"] {
            let unloaded = Arc::clone(&unloaded);
            manager
                .load(name, move || {
                    let unloaded = Arc::clone(&unloaded);
                    Ok(Module::new()
                        .add_event("ready", |_| async { Ok(Flow::Continue) })
                        .set_unload(move |_| async move {
                            unloaded.fetch_add(1, Ordering::SeqCst);
                            Ok(None)
                        }))
                })
                .await
                .unwrap();
        }
        manager
            .load("modules/c", || {
                Ok(Module::new().set_unload(|_| async { Err(AugurError::Other("stuck".into())) }))
            })
            .await
            .unwrap();

        assert_eq!(manager.unload_all().await, 3);
        assert_eq!(unloaded.load(Ordering::SeqCst), 2);
        assert_eq!(reporter.reports().len(), 1);
        assert!(manager.active_origins().is_empty());
        assert!(manager.events().event_names().is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_echo() {
        let (manager, platform, _) = manager();
        manager
            .load("modules/echo", || {
                Ok(Module::new().add_command(
                    Command::builder("echo")
                        .process(|cx: CommandContext, input: CommandInput| async move { cx.reply(input.text()).await })
                        .build()?,
                ))
            })
            .await
            .unwrap();

        assert_eq!(manager.commands().command_count(), 0);
        let found = manager
            .commands()
            .execute(manager.context(), Arc::new(message("u1", "!echo hi")), &ParsedCommand::new("echo", "hi"))
            .await;
        assert!(found);
        assert_eq!(platform.sent_contents(), vec!["hi"]);
        assert_eq!(manager.commands().command_count(), 1);
    }

    #[tokio::test]
    async fn test_routines_can_reach_the_manager() {
        let (manager, platform, _) = manager();
        manager
            .load("modules/admin", || {
                Ok(Module::new().add_command(
                    Command::builder("reload")
                        .process(|cx: CommandContext, input: CommandInput| async move {
                            let Some(modules) = cx.ctx.modules() else { return Ok(()) };
                            modules.reload(&Origin::new(input.text())).await?;
                            cx.reply("reloaded").await
                        })
                        .build()?,
                ))
            })
            .await
            .unwrap();
        manager.load("modules/fun", command_module(&["joke"])).await.unwrap();

        manager
            .commands()
            .execute(
                manager.context(),
                Arc::new(message("u1", "!reload modules/fun")),
                &ParsedCommand::new("reload", "modules/fun"),
            )
            .await;
        assert_eq!(platform.sent_contents(), vec!["reloaded"]);
        assert!(manager.commands().resolve("joke").is_some());
    }

    #[tokio::test]
    async fn test_halting_subscriber_keeps_order_across_reload() {
        let (manager, _, _) = manager();
        manager
            .load("modules/first", || Ok(Module::new().add_event("messageCreate", |_| async { Ok(Flow::Halt) })))
            .await
            .unwrap();
        manager
            .load("modules/second", || {
                Ok(Module::new().add_event("messageCreate", |_| async { Ok(Flow::Continue) }))
            })
            .await
            .unwrap();

        manager.reload(&Origin::new("modules/first")).await.unwrap();
        assert_eq!(
            manager.events().subscribers("messageCreate"),
            vec![Origin::new("modules/second"), Origin::new("modules/first")]
        );

        let event = Arc::new(ClientEvent::MessageCreate(Arc::new(message("u1", "hello"))));
        let outcome = manager.events().dispatch(manager.context(), event).await;
        assert_eq!(outcome, DispatchOutcome::Halted { origin: Origin::new("modules/first") });
    }

    #[tokio::test]
    async fn test_interaction_command_resolved_by_name_on_register() {
        let (manager, platform, _) = manager();
        platform.add_remote_command("777", "roll", crate::core::platform::CommandScope::Global);
        manager
            .load("modules/slash", || {
                Ok(Module::new().add_interaction_command(
                    InteractionCommand::builder().name("roll").process(|icx| async move { icx.respond("4").await }).build()?,
                ))
            })
            .await
            .unwrap();

        let interaction = Arc::new(Interaction::command("i1", "777", "roll", User::new("u1", "ada")));
        manager.interactions().execute_command(manager.context(), interaction).await;
        assert_eq!(platform.responses().len(), 1);
        assert_eq!(platform.responses()[0].content, "4");
    }

    #[tokio::test]
    async fn test_zero_period_clockwork_fails_registration() {
        let (manager, _, reporter) = manager();
        let origin = Origin::new("modules/spin");
        let result = manager
            .load(origin.clone(), || -> Result<Module> {
                Ok(Module::new()
                    .add_command(Command::builder("spin").process(|_, _| async { Ok(()) }).build()?)
                    .every(Duration::ZERO, |_| async { Ok(()) }))
            })
            .await;

        assert!(matches!(result, Err(AugurError::ModuleLoad(_))));
        assert!(!manager.is_active(&origin));
        assert!(!manager.clockwork().contains(&origin));
        assert!(manager.commands().resolve("spin").is_none());
        assert_eq!(reporter.reports()[0].1, "Register: modules/spin");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Register(usize),
        Unload(usize),
        Reload(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize).prop_map(Op::Register),
            (0..4usize).prop_map(Op::Unload),
            (0..4usize).prop_map(Op::Reload),
        ]
    }

    const ORIGINS: [&str; 4] = ["m/0", "m/1", "m/2", "m/3"];
    /// Canonical name first, aliases after.
    const COMMANDS: [&[&str]; 4] = [&["zero"], &["one", "uno"], &["two"], &["three", "tres", "drei"]];

    proptest! {
        #[test]
        fn prop_command_table_tracks_active_origins(ops in proptest::collection::vec(op_strategy(), 0..24)) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            runtime.block_on(async {
                let (manager, _, _) = manager();
                for (i, origin) in ORIGINS.iter().enumerate() {
                    manager.catalog().insert(*origin, command_module(COMMANDS[i]));
                }

                for op in ops {
                    match op {
                        Op::Register(i) => { let _ = manager.register(&Origin::new(ORIGINS[i]), None).await; }
                        Op::Unload(i) => { manager.unload(&Origin::new(ORIGINS[i])).await; }
                        Op::Reload(i) => { let _ = manager.reload(&Origin::new(ORIGINS[i])).await; }
                    }
                }

                let active = manager.active_origins();
                let mut expected: Vec<String> = active
                    .iter()
                    .flat_map(|origin| {
                        let i = ORIGINS.iter().position(|o| *o == origin.as_str()).unwrap();
                        COMMANDS[i].first().map(|name| name.to_string())
                    })
                    .collect();
                expected.sort();
                let mut actual: Vec<String> = manager.commands().list().iter().map(|c| c.key()).collect();
                actual.sort();
                assert_eq!(actual, expected);

                for (i, origin) in ORIGINS.iter().enumerate() {
                    let origin = Origin::new(*origin);
                    let is_active = manager.is_active(&origin);
                    for name in COMMANDS[i] {
                        assert_eq!(manager.commands().resolve(name).is_some(), is_active);
                    }
                }
            });
        }
    }
}
