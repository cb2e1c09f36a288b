//! Event system

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::core::context::Context;
use crate::core::module::Origin;
use crate::core::platform::Permissions;
use crate::error::Result;

pub const READY: &str = "ready";
pub const MESSAGE_CREATE: &str = "messageCreate";
pub const MESSAGE_UPDATE: &str = "messageUpdate";
pub const REACTION_ADD: &str = "messageReactionAdd";
pub const REACTION_REMOVE: &str = "messageReactionRemove";
pub const INTERACTION_CREATE: &str = "interactionCreate";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bot: false,
        }
    }

    #[must_use]
    pub fn as_bot(mut self) -> Self {
        self.bot = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub author: User,
    pub content: String,
}

impl Message {
    pub fn new(author: User, channel_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            channel_id: channel_id.into(),
            guild_id: None,
            author,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub user_id: String,
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InteractionKind {
    /// Slash-style command addressed by its remote id.
    Command {
        command_id: String,
        name: String,
        options: Vec<(String, serde_json::Value)>,
    },
    /// Component callback addressed by a locally chosen custom id.
    Component {
        custom_id: String,
        values: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub kind: InteractionKind,
    pub user: User,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    /// Permissions of the invoking member in the channel.
    pub member_permissions: Permissions,
    /// Permissions of the service itself in the channel.
    pub app_permissions: Permissions,
}

impl Interaction {
    pub fn command(id: impl Into<String>, command_id: impl Into<String>, name: impl Into<String>, user: User) -> Self {
        Self {
            id: id.into(),
            kind: InteractionKind::Command {
                command_id: command_id.into(),
                name: name.into(),
                options: Vec::new(),
            },
            user,
            guild_id: None,
            channel_id: None,
            member_permissions: Permissions::NONE,
            app_permissions: Permissions::NONE,
        }
    }

    pub fn component(id: impl Into<String>, custom_id: impl Into<String>, user: User) -> Self {
        Self {
            id: id.into(),
            kind: InteractionKind::Component {
                custom_id: custom_id.into(),
                values: Vec::new(),
            },
            user,
            guild_id: None,
            channel_id: None,
            member_permissions: Permissions::NONE,
            app_permissions: Permissions::NONE,
        }
    }

    #[must_use]
    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    #[must_use]
    pub fn with_permissions(mut self, member: Permissions, app: Permissions) -> Self {
        self.member_permissions = member;
        self.app_permissions = app;
        self
    }

    /// The id this interaction is routed by: command id or custom id.
    pub fn target_id(&self) -> &str {
        match &self.kind {
            InteractionKind::Command { command_id, .. } => command_id,
            InteractionKind::Component { custom_id, .. } => custom_id,
        }
    }

    pub fn option(&self, name: &str) -> Option<&serde_json::Value> {
        match &self.kind {
            InteractionKind::Command { options, .. } => {
                options.iter().find(|(key, _)| key == name).map(|(_, value)| value)
            }
            InteractionKind::Component { .. } => None,
        }
    }
}

/// Everything the transport can hand to the dispatcher.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Ready { user: User },
    MessageCreate(Arc<Message>),
    MessageUpdate { old: Arc<Message>, new: Arc<Message> },
    ReactionAdd(Reaction),
    ReactionRemove(Reaction),
    InteractionCreate(Arc<Interaction>),
    Other { name: String, payload: serde_json::Value },
}

impl ClientEvent {
    /// Event-name key used by the event registry.
    pub fn name(&self) -> &str {
        match self {
            ClientEvent::Ready { .. } => READY,
            ClientEvent::MessageCreate(_) => MESSAGE_CREATE,
            ClientEvent::MessageUpdate { .. } => MESSAGE_UPDATE,
            ClientEvent::ReactionAdd(_) => REACTION_ADD,
            ClientEvent::ReactionRemove(_) => REACTION_REMOVE,
            ClientEvent::InteractionCreate(_) => INTERACTION_CREATE,
            ClientEvent::Other { name, .. } => name,
        }
    }

    /// The message a command may be parsed from, if any.
    pub fn message(&self) -> Option<&Arc<Message>> {
        match self {
            ClientEvent::MessageCreate(msg) => Some(msg),
            ClientEvent::MessageUpdate { new, .. } => Some(new),
            _ => None,
        }
    }

    pub fn interaction(&self) -> Option<&Arc<Interaction>> {
        match self {
            ClientEvent::InteractionCreate(interaction) => Some(interaction),
            _ => None,
        }
    }
}

/// What a subscriber tells the dispatcher after seeing an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    Halt,
}

impl From<bool> for Flow {
    fn from(halt: bool) -> Self {
        if halt {
            Flow::Halt
        } else {
            Flow::Continue
        }
    }
}

/// Result of walking one event bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every subscriber ran and none asked to halt.
    Completed,
    /// A subscriber returned [`Flow::Halt`].
    Halted { origin: Origin },
    /// A subscriber failed; the error was reported and the walk stopped.
    Failed { origin: Origin },
}

impl DispatchOutcome {
    pub fn is_halted(&self) -> bool {
        !matches!(self, DispatchOutcome::Completed)
    }
}

/// Argument handed to event subscribers.
#[derive(Clone)]
pub struct EventContext {
    pub ctx: Context,
    pub event: Arc<ClientEvent>,
}

impl EventContext {
    pub fn name(&self) -> &str {
        self.event.name()
    }

    pub fn message(&self) -> Option<&Arc<Message>> {
        self.event.message()
    }
}

pub type EventRoutine = Arc<dyn Fn(EventContext) -> BoxFuture<'static, Result<Flow>> + Send + Sync>;

/// Wrap an async closure as an [`EventRoutine`].
pub fn handler<F, Fut>(f: F) -> EventRoutine
where
    F: Fn(EventContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Flow>> + Send + 'static,
{
    Arc::new(move |ecx| f(ecx).boxed())
}
