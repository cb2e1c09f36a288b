//! Id-addressed invocations: interaction commands and component handlers

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use crate::core::command::{allow_all, predicate, Predicate};
use crate::core::context::Context;
use crate::core::event::{Interaction, User};
use crate::core::module::Origin;
use crate::core::platform::{CommandScope, InteractionResponse, Permissions};
use crate::error::{AugurError, Result};

pub type InteractionProcess = Arc<dyn Fn(InteractionContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

fn process_fn<F, Fut>(f: F) -> InteractionProcess
where
    F: Fn(InteractionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |icx| f(icx).boxed())
}

/// Argument handed to interaction predicates and routines.
#[derive(Clone)]
pub struct InteractionContext {
    pub ctx: Context,
    pub interaction: Arc<Interaction>,
}

impl InteractionContext {
    pub fn user(&self) -> &User {
        &self.interaction.user
    }

    pub fn in_guild(&self) -> bool {
        self.interaction.guild_id.is_some()
    }

    pub async fn respond(&self, content: impl Into<String>) -> Result<()> {
        self.ctx
            .platform()
            .respond(&self.interaction, InteractionResponse::new(content))
            .await
    }

    pub async fn respond_ephemeral(&self, content: impl Into<String>) -> Result<()> {
        self.ctx
            .platform()
            .respond(&self.interaction, InteractionResponse::ephemeral(content))
            .await
    }
}

pub struct InteractionCommand {
    /// Remote-assigned id; resolved from `name` at registration when absent.
    pub id: Option<String>,
    pub name: String,
    pub scope: CommandScope,
    pub description: String,
    pub syntax: String,
    pub category: String,
    pub hidden: bool,
    pub enabled: bool,
    pub guild_only: bool,
    pub dm_only: bool,
    pub owner_only: bool,
    /// Permissions the invoking member must hold.
    pub member_permissions: Permissions,
    /// Permissions the service itself must hold.
    pub client_permissions: Permissions,
    permissions: Predicate<InteractionContext>,
    process: InteractionProcess,
    origin: Option<Origin>,
}

impl InteractionCommand {
    pub fn builder() -> InteractionCommandBuilder {
        InteractionCommandBuilder::default()
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub(crate) fn set_origin(&mut self, origin: Origin) {
        self.origin = Some(origin);
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    pub async fn permitted(&self, icx: InteractionContext) -> Result<bool> {
        (self.permissions)(icx).await
    }

    pub async fn run(&self, icx: InteractionContext) -> Result<()> {
        (self.process)(icx).await
    }
}

impl fmt::Debug for InteractionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionCommand")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("enabled", &self.enabled)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct InteractionCommandBuilder {
    id: Option<String>,
    name: Option<String>,
    scope: CommandScope,
    description: String,
    syntax: String,
    category: Option<String>,
    hidden: bool,
    disabled: bool,
    guild_only: bool,
    dm_only: bool,
    owner_only: bool,
    member_permissions: Permissions,
    client_permissions: Permissions,
    permissions: Option<Predicate<InteractionContext>>,
    process: Option<InteractionProcess>,
}

impl InteractionCommandBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn guild(mut self, guild_id: impl Into<String>) -> Self {
        self.scope = CommandScope::Guild(guild_id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = syntax.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.disabled = !enabled;
        self
    }

    pub fn guild_only(mut self, guild_only: bool) -> Self {
        self.guild_only = guild_only;
        self
    }

    pub fn dm_only(mut self, dm_only: bool) -> Self {
        self.dm_only = dm_only;
        self
    }

    pub fn owner_only(mut self, owner_only: bool) -> Self {
        self.owner_only = owner_only;
        self
    }

    pub fn member_permissions(mut self, required: Permissions) -> Self {
        self.member_permissions = required;
        self
    }

    pub fn client_permissions(mut self, required: Permissions) -> Self {
        self.client_permissions = required;
        self
    }

    pub fn permissions<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(InteractionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.permissions = Some(predicate(f));
        self
    }

    pub fn process<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(InteractionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.process = Some(process_fn(f));
        self
    }

    pub fn build(self) -> Result<InteractionCommand> {
        let id = self.id.filter(|id| !id.trim().is_empty());
        let name = self.name.map(|n| n.trim().to_string()).unwrap_or_default();
        if id.is_none() && name.is_empty() {
            return Err(AugurError::ModuleLoad(
                "Interaction commands must have an id or a name.".to_string(),
            ));
        }
        let process = self.process.ok_or_else(|| {
            AugurError::ModuleLoad("Interaction commands must have a process property.".to_string())
        })?;

        Ok(InteractionCommand {
            id,
            name,
            scope: self.scope,
            description: self.description,
            syntax: self.syntax,
            category: self.category.unwrap_or_else(|| "General".to_string()),
            hidden: self.hidden,
            enabled: !self.disabled,
            guild_only: self.guild_only,
            dm_only: self.dm_only,
            owner_only: self.owner_only,
            member_permissions: self.member_permissions,
            client_permissions: self.client_permissions,
            permissions: self.permissions.unwrap_or_else(allow_all),
            process,
            origin: None,
        })
    }
}

pub struct InteractionHandler {
    pub custom_id: String,
    pub enabled: bool,
    /// Deregister before the first invocation.
    pub once: bool,
    permissions: Predicate<InteractionContext>,
    process: InteractionProcess,
    origin: Option<Origin>,
}

impl InteractionHandler {
    pub fn new<F, Fut>(custom_id: impl Into<String>, process: F) -> Self
    where
        F: Fn(InteractionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            custom_id: custom_id.into(),
            enabled: true,
            once: false,
            permissions: allow_all(),
            process: process_fn(process),
            origin: None,
        }
    }

    #[must_use]
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn permissions<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(InteractionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.permissions = predicate(f);
        self
    }

    /// Fails when the custom id is blank.
    pub fn validate(self) -> Result<Self> {
        if self.custom_id.trim().is_empty() {
            return Err(AugurError::ModuleLoad(
                "Interaction handlers must have a custom id.".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub(crate) fn set_origin(&mut self, origin: Origin) {
        self.origin = Some(origin);
    }

    pub async fn permitted(&self, icx: InteractionContext) -> Result<bool> {
        (self.permissions)(icx).await
    }

    pub async fn run(&self, icx: InteractionContext) -> Result<()> {
        (self.process)(icx).await
    }
}

impl fmt::Debug for InteractionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionHandler")
            .field("custom_id", &self.custom_id)
            .field("enabled", &self.enabled)
            .field("once", &self.once)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}
