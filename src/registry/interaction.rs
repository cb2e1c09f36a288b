//! Id-addressed tables for interaction commands and component handlers

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use crate::core::context::Context;
use crate::core::event::Interaction;
use crate::core::interaction::{InteractionCommand, InteractionContext, InteractionHandler};
use crate::core::module::Origin;
use crate::core::platform::{CommandScope, RemoteCommand};
use crate::core::report::{ErrorContext, FailureReason, LifecycleOp};
use crate::error::{AugurError, Result};

#[derive(Default)]
struct InteractionTables {
    commands: HashMap<String, Arc<InteractionCommand>>,
    handlers: HashMap<String, Arc<InteractionHandler>>,
}

/// Last write wins for both commands and handlers.
#[derive(Default)]
pub struct InteractionRegistry {
    tables: RwLock<InteractionTables>,
    remote: RwLock<HashMap<CommandScope, Vec<RemoteCommand>>>,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a module's interaction entries.
    ///
    /// Commands without an id are resolved by name against the remote command
    /// list. Each scope is refreshed from the platform at most once per call;
    /// a command still unresolved afterwards is reported and skipped.
    pub async fn register(
        &self,
        ctx: &Context,
        origin: &Origin,
        commands: Vec<InteractionCommand>,
        handlers: Vec<InteractionHandler>,
    ) -> usize {
        let mut refreshed = HashSet::new();
        let mut resolved = Vec::with_capacity(commands.len());

        for mut command in commands {
            if command.id.is_none() {
                let lookup = self.resolve_remote_id(ctx, &command, &mut refreshed).await.and_then(|id| {
                    id.ok_or_else(|| {
                        AugurError::Registration(format!(
                            "No remote id for interaction command \"{}\" ({})",
                            command.name, command.scope
                        ))
                    })
                });
                match lookup {
                    Ok(id) => command.set_id(id),
                    Err(e) => {
                        let op = LifecycleOp::Register;
                        ctx.report(&e, &ErrorContext::Lifecycle { origin: origin.clone(), op });
                        continue;
                    }
                }
            }
            command.set_origin(origin.clone());
            resolved.push(command);
        }

        let mut conflicts = Vec::new();
        let mut installed = 0;
        {
            let mut tables = self.tables.write();
            for command in resolved {
                let Some(id) = command.id.clone() else { continue };
                if let Some(previous) = tables.commands.insert(id.clone(), Arc::new(command)) {
                    tracing::warn!(
                        id = %id,
                        origin = %origin,
                        previous = ?previous.origin().map(Origin::as_str),
                        "interaction command id registered twice; replacing"
                    );
                    conflicts.push(format!("interaction command id \"{}\"", id));
                }
                installed += 1;
            }
            for mut handler in handlers {
                handler.set_origin(origin.clone());
                let custom_id = handler.custom_id.clone();
                if let Some(previous) = tables.handlers.insert(custom_id.clone(), Arc::new(handler)) {
                    tracing::warn!(
                        custom_id = %custom_id,
                        origin = %origin,
                        previous = ?previous.origin().map(Origin::as_str),
                        "interaction handler id registered twice; replacing"
                    );
                    conflicts.push(format!("interaction handler id \"{}\"", custom_id));
                }
                installed += 1;
            }
        }

        for conflict in conflicts {
            let e = AugurError::Registration(format!("{} registered twice; replaced", conflict));
            ctx.report(&e, &ErrorContext::Lifecycle { origin: origin.clone(), op: LifecycleOp::Register });
        }
        installed
    }

    async fn resolve_remote_id(
        &self,
        ctx: &Context,
        command: &InteractionCommand,
        refreshed: &mut HashSet<CommandScope>,
    ) -> Result<Option<String>> {
        if let Some(id) = self.cached_id(&command.name, &command.scope) {
            return Ok(Some(id));
        }
        if !refreshed.insert(command.scope.clone()) {
            return Ok(None);
        }
        self.refresh(ctx, &command.scope).await?;
        Ok(self.cached_id(&command.name, &command.scope))
    }

    fn cached_id(&self, name: &str, scope: &CommandScope) -> Option<String> {
        self.remote
            .read()
            .get(scope)?
            .iter()
            .find(|remote| remote.name.eq_ignore_ascii_case(name))
            .map(|remote| remote.id.clone())
    }

    /// Replace the cached remote command list for `scope`.
    pub async fn refresh(&self, ctx: &Context, scope: &CommandScope) -> Result<()> {
        tracing::debug!(scope = %scope, "fetching remote application commands");
        let fetched = ctx.platform().fetch_application_commands(scope).await?;
        self.remote.write().insert(scope.clone(), fetched);
        Ok(())
    }

    pub fn resolve_command(&self, id: &str) -> Option<Arc<InteractionCommand>> {
        self.tables.read().commands.get(id).cloned()
    }

    pub fn resolve_handler(&self, custom_id: &str) -> Option<Arc<InteractionHandler>> {
        self.tables.read().handlers.get(custom_id).cloned()
    }

    /// Unbind a fire-once handler. False when another invocation already
    /// claimed it while this one was gated.
    fn claim_once(&self, handler: &Arc<InteractionHandler>) -> bool {
        let mut tables = self.tables.write();
        let still_bound = tables
            .handlers
            .get(&handler.custom_id)
            .is_some_and(|current| Arc::ptr_eq(current, handler));
        if still_bound {
            tables.handlers.remove(&handler.custom_id);
        }
        still_bound
    }

    /// Gate and run the command bound to the interaction's command id.
    pub async fn execute_command(&self, ctx: &Context, interaction: Arc<Interaction>) {
        let Some(command) = self.resolve_command(interaction.target_id()) else {
            fail(ctx, interaction, FailureReason::HandlerMissing).await;
            return;
        };
        let icx = scoped(ctx, command.origin(), interaction);

        match command_gate(&command, &icx).await {
            Ok(None) => {
                if let Err(e) = command.run(icx.clone()).await {
                    icx.ctx.report(&e, &ErrorContext::Interaction(Arc::clone(&icx.interaction)));
                }
            }
            Ok(Some(reason)) => icx.ctx.reporter().interaction_failed(&icx, reason).await,
            Err(e) => icx.ctx.report(&e, &ErrorContext::Interaction(Arc::clone(&icx.interaction))),
        }
    }

    /// Gate and run the handler bound to the interaction's custom id.
    ///
    /// Fire-once handlers are removed before their routine runs.
    pub async fn execute_handler(&self, ctx: &Context, interaction: Arc<Interaction>) {
        let Some(handler) = self.resolve_handler(interaction.target_id()) else {
            fail(ctx, interaction, FailureReason::HandlerMissing).await;
            return;
        };
        let icx = scoped(ctx, handler.origin(), interaction);

        if !handler.enabled {
            icx.ctx.reporter().interaction_failed(&icx, FailureReason::Disabled).await;
            return;
        }
        match handler.permitted(icx.clone()).await {
            Ok(true) => {}
            Ok(false) => {
                icx.ctx.reporter().interaction_failed(&icx, FailureReason::Forbidden).await;
                return;
            }
            Err(e) => {
                icx.ctx.report(&e, &ErrorContext::Interaction(Arc::clone(&icx.interaction)));
                return;
            }
        }

        if handler.once && !self.claim_once(&handler) {
            icx.ctx.reporter().interaction_failed(&icx, FailureReason::HandlerMissing).await;
            return;
        }

        if let Err(e) = handler.run(icx.clone()).await {
            icx.ctx.report(&e, &ErrorContext::Interaction(Arc::clone(&icx.interaction)));
        }
    }

    pub fn unload_origin(&self, origin: &Origin) -> usize {
        let mut tables = self.tables.write();
        let before = tables.commands.len() + tables.handlers.len();
        tables.commands.retain(|_, command| command.origin() != Some(origin));
        tables.handlers.retain(|_, handler| handler.origin() != Some(origin));
        before - tables.commands.len() - tables.handlers.len()
    }

    pub fn has_origin(&self, origin: &Origin) -> bool {
        let tables = self.tables.read();
        tables.commands.values().any(|c| c.origin() == Some(origin))
            || tables.handlers.values().any(|h| h.origin() == Some(origin))
    }

    pub fn len(&self) -> usize {
        let tables = self.tables.read();
        tables.commands.len() + tables.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut tables = self.tables.write();
        tables.commands.clear();
        tables.handlers.clear();
    }
}

fn scoped(ctx: &Context, origin: Option<&Origin>, interaction: Arc<Interaction>) -> InteractionContext {
    let ctx = match origin {
        Some(origin) => ctx.with_module(origin.clone()),
        None => ctx.clone(),
    };
    InteractionContext { ctx, interaction }
}

async fn fail(ctx: &Context, interaction: Arc<Interaction>, reason: FailureReason) {
    let icx = InteractionContext {
        ctx: ctx.clone(),
        interaction,
    };
    ctx.reporter().interaction_failed(&icx, reason).await;
}

/// Gate order: enabled, predicate, member permissions, client permissions,
/// guild/DM scope, owner. Returns the first failing gate.
async fn command_gate(command: &InteractionCommand, icx: &InteractionContext) -> Result<Option<FailureReason>> {
    if !command.enabled {
        return Ok(Some(FailureReason::Disabled));
    }
    if !command.permitted(icx.clone()).await? {
        return Ok(Some(FailureReason::Forbidden));
    }

    let interaction = &icx.interaction;
    if interaction.guild_id.is_some() {
        if !interaction.member_permissions.contains(command.member_permissions) {
            return Ok(Some(FailureReason::PermissionsMissing));
        }
        if !interaction.app_permissions.contains(command.client_permissions) {
            return Ok(Some(FailureReason::ClientPermissionsMissing));
        }
    }

    if command.guild_only && interaction.guild_id.is_none() {
        return Ok(Some(FailureReason::GuildOnly));
    }
    if command.dm_only && interaction.guild_id.is_some() {
        return Ok(Some(FailureReason::DmOnly));
    }
    if command.owner_only && !icx.ctx.config().is_owner(&interaction.user.id) {
        return Ok(Some(FailureReason::OwnerOnly));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::User;
    use crate::core::platform::Permissions;
    use crate::testing::test_context;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_command(id: &str, runs: &Arc<AtomicUsize>) -> InteractionCommand {
        let runs = Arc::clone(runs);
        InteractionCommand::builder()
            .id(id)
            .process(move |_| {
                let runs = Arc::clone(&runs);
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .build()
            .unwrap()
    }

    fn slash(command_id: &str) -> Arc<Interaction> {
        Arc::new(Interaction::command("i1", command_id, "cmd", User::new("u1", "ada")))
    }

    #[tokio::test]
    async fn test_duplicate_id_last_write_wins() {
        let (ctx, _, _) = test_context();
        let registry = InteractionRegistry::new();
        let runs = Arc::new(AtomicUsize::new(0));

        registry.register(&ctx, &Origin::new("first"), vec![counting_command("100", &runs)], vec![]).await;
        registry.register(&ctx, &Origin::new("second"), vec![counting_command("100", &runs)], vec![]).await;

        let bound = registry.resolve_command("100").unwrap();
        assert_eq!(bound.origin(), Some(&Origin::new("second")));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_reported() {
        let (ctx, _, reporter) = test_context();
        let registry = InteractionRegistry::new();
        let runs = Arc::new(AtomicUsize::new(0));

        registry
            .register(&ctx, &Origin::new("first"), vec![counting_command("100", &runs)], vec![])
            .await;
        assert!(reporter.reports().is_empty());

        let button = InteractionHandler::new("b", |_| async { Ok(()) });
        let again = InteractionHandler::new("b", |_| async { Ok(()) });
        registry
            .register(&ctx, &Origin::new("second"), vec![counting_command("100", &runs)], vec![button, again])
            .await;

        let reports = reporter.reports();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].0.contains("interaction command id \"100\""));
        assert!(reports[1].0.contains("interaction handler id \"b\""));
        assert_eq!(reports[0].1, "Register: second");
        assert_eq!(registry.resolve_command("100").unwrap().origin(), Some(&Origin::new("second")));
    }

    #[tokio::test]
    async fn test_name_resolution_refreshes_once() {
        let (ctx, platform, reporter) = test_context();
        platform.add_remote_command("555", "ping", CommandScope::Global);
        let registry = InteractionRegistry::new();

        let ping = InteractionCommand::builder().name("ping").process(|_| async { Ok(()) }).build().unwrap();
        let ghost = InteractionCommand::builder().name("ghost").process(|_| async { Ok(()) }).build().unwrap();
        let ghost2 = InteractionCommand::builder().name("ghost2").process(|_| async { Ok(()) }).build().unwrap();

        let installed = registry.register(&ctx, &Origin::new("m"), vec![ping, ghost, ghost2], vec![]).await;
        assert_eq!(installed, 1);
        assert_eq!(platform.fetch_count(), 1);
        assert!(registry.resolve_command("555").is_some());
        assert_eq!(reporter.reports().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_handler_reports_failure() {
        let (ctx, _, reporter) = test_context();
        let registry = InteractionRegistry::new();
        registry.execute_command(&ctx, slash("404")).await;
        registry
            .execute_handler(&ctx, Arc::new(Interaction::component("i2", "nobody", User::new("u1", "ada"))))
            .await;
        assert_eq!(
            reporter.failures(),
            vec![FailureReason::HandlerMissing, FailureReason::HandlerMissing]
        );
    }

    #[tokio::test]
    async fn test_gates_in_order() {
        let (ctx, _, reporter) = test_context();
        let registry = InteractionRegistry::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let runs_clone = Arc::clone(&runs);
        let strict = InteractionCommand::builder()
            .id("1")
            .member_permissions(Permissions::KICK_MEMBERS)
            .client_permissions(Permissions::SEND_MESSAGES)
            .guild_only(true)
            .owner_only(true)
            .process(move |_| {
                let runs = Arc::clone(&runs_clone);
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .build()
            .unwrap();
        registry.register(&ctx, &Origin::new("m"), vec![strict], vec![]).await;

        let user = User::new("u1", "ada");
        let base = Interaction::command("i", "1", "strict", user.clone());

        registry.execute_command(&ctx, Arc::new(base.clone().in_guild("g"))).await;
        registry
            .execute_command(
                &ctx,
                Arc::new(base.clone().in_guild("g").with_permissions(Permissions::KICK_MEMBERS, Permissions::NONE)),
            )
            .await;
        registry.execute_command(&ctx, Arc::new(base.clone())).await;
        registry
            .execute_command(
                &ctx,
                Arc::new(
                    base.in_guild("g")
                        .with_permissions(Permissions::KICK_MEMBERS, Permissions::SEND_MESSAGES),
                ),
            )
            .await;

        assert_eq!(
            reporter.failures(),
            vec![
                FailureReason::PermissionsMissing,
                FailureReason::ClientPermissionsMissing,
                FailureReason::GuildOnly,
                FailureReason::OwnerOnly,
            ]
        );
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_owner_passes_and_disabled_fails() {
        let (ctx, _, reporter) = test_context();
        let registry = InteractionRegistry::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let mut owner_cmd = counting_command("1", &runs);
        owner_cmd.owner_only = true;
        let mut off = counting_command("2", &runs);
        off.enabled = false;
        registry.register(&ctx, &Origin::new("m"), vec![owner_cmd, off], vec![]).await;

        let owner = User::new("owner", "root");
        registry
            .execute_command(&ctx, Arc::new(Interaction::command("i", "1", "cmd", owner.clone())))
            .await;
        registry
            .execute_command(&ctx, Arc::new(Interaction::command("i", "2", "cmd", owner)))
            .await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(reporter.failures(), vec![FailureReason::Disabled]);
    }

    #[tokio::test]
    async fn test_fire_once_handler_deregisters_before_running() {
        let (ctx, _, reporter) = test_context();
        let registry = Arc::new(InteractionRegistry::new());
        let seen_bound = Arc::new(AtomicUsize::new(0));

        let watched_registry = Arc::clone(&registry);
        let seen = Arc::clone(&seen_bound);
        let handler = InteractionHandler::new("confirm", move |_| {
            let registry = Arc::clone(&watched_registry);
            let seen = Arc::clone(&seen);
            async move {
                if registry.resolve_handler("confirm").is_some() {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }
        })
        .once();
        registry.register(&ctx, &Origin::new("m"), vec![], vec![handler]).await;

        let click = Arc::new(Interaction::component("i", "confirm", User::new("u1", "ada")));
        registry.execute_handler(&ctx, Arc::clone(&click)).await;
        registry.execute_handler(&ctx, click).await;

        assert_eq!(seen_bound.load(Ordering::SeqCst), 0);
        assert_eq!(reporter.failures(), vec![FailureReason::HandlerMissing]);
    }

    #[tokio::test]
    async fn test_fire_once_handler_runs_once_when_interleaved() {
        let (ctx, _, reporter) = test_context();
        let registry = InteractionRegistry::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        let handler = InteractionHandler::new("confirm", move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .permissions(|_| async {
            tokio::task::yield_now().await;
            Ok(true)
        })
        .once();
        registry.register(&ctx, &Origin::new("m"), vec![], vec![handler]).await;

        let user = User::new("u1", "ada");
        let first = Arc::new(Interaction::component("i1", "confirm", user.clone()));
        let second = Arc::new(Interaction::component("i2", "confirm", user));
        tokio::join!(
            registry.execute_handler(&ctx, first),
            registry.execute_handler(&ctx, second)
        );

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(reporter.failures(), vec![FailureReason::HandlerMissing]);
        assert!(registry.resolve_handler("confirm").is_none());
    }

    #[tokio::test]
    async fn test_unload_origin_strips_entries() {
        let (ctx, _, _) = test_context();
        let registry = InteractionRegistry::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let origin = Origin::new("m");

        registry
            .register(
                &ctx,
                &origin,
                vec![counting_command("1", &runs)],
                vec![InteractionHandler::new("b", |_| async { Ok(()) })],
            )
            .await;
        assert!(registry.has_origin(&origin));
        assert_eq!(registry.unload_origin(&origin), 2);
        assert!(!registry.has_origin(&origin));
        assert!(registry.is_empty());
    }
}
