//! The owning client: routes platform events through modules

use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use crate::core::context::{Context, ContextBuilder};
use crate::core::event::{ClientEvent, DispatchOutcome, InteractionKind, Message};
use crate::core::interaction::InteractionContext;
use crate::core::module::{Module, Origin};
use crate::core::platform::Platform;
use crate::core::report::{ErrorContext, FailureReason, Reporter};
use crate::error::{AugurError, Result};
use crate::runtime::catalog::ModuleCatalog;
use crate::runtime::config::ClientConfig;
use crate::runtime::intents::{self, GatewayIntents};
use crate::runtime::manager::ModuleManager;
use crate::runtime::parse::{Parser, PrefixParser};

type Constructor = Box<dyn Fn() -> Result<Module> + Send + Sync>;

pub struct ClientBuilder {
    config: Option<ClientConfig>,
    platform: Option<Arc<dyn Platform>>,
    reporter: Option<Arc<dyn Reporter>>,
    parser: Option<Arc<dyn Parser>>,
    catalog: Option<Arc<ModuleCatalog>>,
    include_registered: bool,
    modules: Vec<(Origin, Constructor)>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            platform: None,
            reporter: None,
            parser: None,
            catalog: None,
            include_registered: false,
            modules: Vec::new(),
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

    pub fn with_parser(mut self, parser: Arc<dyn Parser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<ModuleCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Also catalog every module submitted through `module_init!`.
    pub fn with_registered_modules(mut self) -> Self {
        self.include_registered = true;
        self
    }

    pub fn add_module<F>(mut self, origin: impl Into<Origin>, construct: F) -> Self
    where
        F: Fn() -> Result<Module> + Send + Sync + 'static,
    {
        self.modules.push((origin.into(), Box::new(construct)));
        self
    }

    /// Build the client and register the startup modules: `config.modules`
    /// when set, otherwise everything in the catalog. A module that fails to
    /// register is reported and skipped.
    pub async fn build(self) -> Result<AugurClient> {
        let config = self.config.unwrap_or_default();
        let platform = self
            .platform
            .ok_or_else(|| AugurError::Config("A platform is required".to_string()))?;
        let mut context = ContextBuilder::new().with_config(config).with_platform(platform);
        if let Some(reporter) = self.reporter {
            context = context.with_reporter(reporter);
        }
        let ctx = context.build()?;

        let catalog = self.catalog.unwrap_or_default();
        if self.include_registered {
            catalog.add_registered();
        }
        for (origin, construct) in self.modules {
            catalog.insert(origin, construct);
        }

        let intents = intents::calculate(&ctx.config().events, ctx.config().process_dms);
        let manager = ModuleManager::new(ctx, Arc::clone(&catalog));

        let startup: Vec<Origin> = if manager.context().config().modules.is_empty() {
            catalog.origins()
        } else {
            manager.context().config().modules.iter().map(Origin::new).collect()
        };
        let registered = manager.register_all(startup.iter().cloned()).await;
        tracing::info!(registered, requested = startup.len(), intents = %intents, "client built");

        Ok(AugurClient {
            manager,
            parser: self.parser.unwrap_or_else(|| Arc::new(PrefixParser)),
            intents,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatcher for one platform connection.
pub struct AugurClient {
    manager: Arc<ModuleManager>,
    parser: Arc<dyn Parser>,
    intents: GatewayIntents,
}

impl AugurClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn modules(&self) -> &Arc<ModuleManager> {
        &self.manager
    }

    pub fn context(&self) -> &Context {
        self.manager.context()
    }

    pub fn config(&self) -> &ClientConfig {
        self.context().config()
    }

    /// Gateway intents needed for the configured events.
    pub fn intents(&self) -> GatewayIntents {
        self.intents
    }

    /// Route one event: subscribers first, then command or interaction
    /// handling unless a subscriber halted.
    pub async fn handle_event(&self, event: ClientEvent) -> DispatchOutcome {
        let event = Arc::new(event);
        let ctx = self.context();

        match &*event {
            ClientEvent::Ready { user } => {
                let flushed = self.manager.mark_ready().await;
                tracing::info!(user = %user.name, deferred_interactions = flushed, "ready");
                self.manager.events().dispatch(ctx, Arc::clone(&event)).await
            }
            ClientEvent::MessageCreate(message) => {
                let outcome = self.manager.events().dispatch(ctx, Arc::clone(&event)).await;
                if !outcome.is_halted() {
                    self.run_command(Arc::clone(message)).await;
                }
                outcome
            }
            ClientEvent::MessageUpdate { old, new } => {
                if old.content == new.content {
                    return DispatchOutcome::Completed;
                }
                let outcome = self.manager.events().dispatch(ctx, Arc::clone(&event)).await;
                if !outcome.is_halted() {
                    self.run_command(Arc::clone(new)).await;
                }
                outcome
            }
            ClientEvent::InteractionCreate(interaction) => {
                let outcome = self.manager.events().dispatch(ctx, Arc::clone(&event)).await;
                if outcome.is_halted() {
                    let icx = InteractionContext {
                        ctx: ctx.clone(),
                        interaction: Arc::clone(interaction),
                    };
                    ctx.reporter().interaction_failed(&icx, FailureReason::Halted).await;
                    return outcome;
                }
                match interaction.kind {
                    InteractionKind::Command { .. } => {
                        self.manager.interactions().execute_command(ctx, Arc::clone(interaction)).await;
                    }
                    InteractionKind::Component { .. } => {
                        self.manager.interactions().execute_handler(ctx, Arc::clone(interaction)).await;
                    }
                }
                outcome
            }
            ClientEvent::ReactionAdd(_) | ClientEvent::ReactionRemove(_) | ClientEvent::Other { .. } => {
                if !self.config().listens_to(event.name()) {
                    tracing::trace!(event = %event.name(), "event not configured; skipping");
                    return DispatchOutcome::Completed;
                }
                self.manager.events().dispatch(ctx, Arc::clone(&event)).await
            }
        }
    }

    async fn run_command(&self, message: Arc<Message>) {
        let ctx = self.context();
        match self.parser.parse(ctx, &message).await {
            Ok(Some(parsed)) => {
                self.manager.commands().execute(ctx, message, &parsed).await;
            }
            Ok(None) => {}
            Err(e) => ctx.report(&e, &ErrorContext::Message(message)),
        }
    }

    /// Handle events until the stream ends, then shut down.
    pub async fn run<S>(&self, events: S) -> usize
    where
        S: Stream<Item = ClientEvent> + Send,
    {
        futures::pin_mut!(events);
        let mut handled = 0;
        while let Some(event) = events.next().await {
            self.handle_event(event).await;
            handled += 1;
        }
        self.shutdown().await;
        handled
    }

    /// Unload every module.
    pub async fn shutdown(&self) -> usize {
        tracing::info!("shutting down");
        self.manager.unload_all().await
    }

    pub async fn shutdown_with_timeout(&self, limit: Duration) -> Result<usize> {
        timeout(limit, self.shutdown())
            .await
            .map_err(|_| AugurError::Lifecycle(format!("Shutdown timeout after {:?}", limit)))
    }
}
