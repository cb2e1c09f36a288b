//! Transport-facing types: the owning client surface and permission bits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use crate::core::event::{Interaction, Message, User};
use crate::error::Result;

/// Permission bit set as reported by the platform.
///
/// Implemented as a `u64` newtype with manual bitwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Permissions(u64);

impl Permissions {
    pub const NONE: Self = Self(0);
    pub const CREATE_INSTANT_INVITE: Self = Self(1 << 0);
    pub const KICK_MEMBERS: Self = Self(1 << 1);
    pub const BAN_MEMBERS: Self = Self(1 << 2);
    pub const ADMINISTRATOR: Self = Self(1 << 3);
    pub const MANAGE_CHANNELS: Self = Self(1 << 4);
    pub const MANAGE_GUILD: Self = Self(1 << 5);
    pub const ADD_REACTIONS: Self = Self(1 << 6);
    pub const VIEW_CHANNEL: Self = Self(1 << 10);
    pub const SEND_MESSAGES: Self = Self(1 << 11);
    pub const MANAGE_MESSAGES: Self = Self(1 << 13);
    pub const EMBED_LINKS: Self = Self(1 << 14);
    pub const ATTACH_FILES: Self = Self(1 << 15);
    pub const READ_MESSAGE_HISTORY: Self = Self(1 << 16);
    pub const MENTION_EVERYONE: Self = Self(1 << 17);
    pub const MANAGE_ROLES: Self = Self(1 << 28);
    pub const MANAGE_WEBHOOKS: Self = Self(1 << 29);
    pub const MODERATE_MEMBERS: Self = Self(1 << 40);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `required` is granted.
    pub const fn contains(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// The bits of `required` that are not granted.
    pub const fn missing(self, required: Self) -> Self {
        Self(required.0 & !self.0)
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Where a remote-registered interaction command lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandScope {
    #[default]
    Global,
    Guild(String),
}

impl fmt::Display for CommandScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandScope::Global => write!(f, "global"),
            CommandScope::Guild(id) => write!(f, "guild:{}", id),
        }
    }
}

/// An interaction command as the platform knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCommand {
    pub id: String,
    pub name: String,
    pub scope: CommandScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionResponse {
    pub content: String,
    pub ephemeral: bool,
}

impl InteractionResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

/// The owning client: everything the engine needs from the real-time connection.
#[async_trait]
pub trait Platform: Send + Sync + 'static {
    /// The service's own identity; `None` until the connection is ready.
    fn current_user(&self) -> Option<User>;

    fn is_ready(&self) -> bool {
        self.current_user().is_some()
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()>;

    async fn reply(&self, message: &Message, content: &str) -> Result<()> {
        self.send_message(&message.channel_id, content).await
    }

    async fn respond(&self, interaction: &Interaction, response: InteractionResponse) -> Result<()>;

    async fn fetch_application_commands(&self, scope: &CommandScope) -> Result<Vec<RemoteCommand>>;
}
