//! Failure sinks handed to the excluded subsystems

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use crate::core::event::{Interaction, Message};
use crate::core::interaction::InteractionContext;
use crate::core::module::Origin;
use crate::error::AugurError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    Register,
    Unload,
    Reload,
    UnloadAll,
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            LifecycleOp::Register => "Register",
            LifecycleOp::Unload => "Unload",
            LifecycleOp::Reload => "Reload",
            LifecycleOp::UnloadAll => "UnloadAll",
        };
        f.write_str(op)
    }
}

/// Where a failure was caught.
#[derive(Debug, Clone)]
pub enum ErrorContext {
    Message(Arc<Message>),
    Command { name: String, message: Arc<Message> },
    Interaction(Arc<Interaction>),
    Event { name: String, origin: Option<Origin> },
    Clockwork(Option<Origin>),
    Lifecycle { origin: Origin, op: LifecycleOp },
    Other(String),
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorContext::Message(msg) => {
                let place = msg.guild_id.as_deref().map_or_else(
                    || "DM".to_string(),
                    |guild| format!("{} > {}", guild, msg.channel_id),
                );
                write!(f, "{} in {}: {}", msg.author.name, place, msg.content)
            }
            ErrorContext::Command { name, message } => {
                write!(f, "command \"{}\" from {}: {}", name, message.author.name, message.content)
            }
            ErrorContext::Interaction(interaction) => {
                write!(f, "interaction {} ({}) from {}", interaction.id, interaction.target_id(), interaction.user.name)
            }
            ErrorContext::Event { name, origin: Some(origin) } => write!(f, "{} handler in {}", name, origin),
            ErrorContext::Event { name, origin: None } => write!(f, "{} handler", name),
            ErrorContext::Clockwork(Some(origin)) => write!(f, "clockwork in {}", origin),
            ErrorContext::Clockwork(None) => f.write_str("clockwork"),
            ErrorContext::Lifecycle { origin, op } => write!(f, "{}: {}", op, origin),
            ErrorContext::Other(detail) => f.write_str(detail),
        }
    }
}

/// Why an interaction was not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    Halted,
    HandlerMissing,
    Disabled,
    Forbidden,
    PermissionsMissing,
    ClientPermissionsMissing,
    GuildOnly,
    DmOnly,
    OwnerOnly,
}

impl FailureReason {
    pub fn code(self) -> &'static str {
        match self {
            FailureReason::Halted => "HALTED",
            FailureReason::HandlerMissing => "HANDLER_MISSING",
            FailureReason::Disabled => "DISABLED",
            FailureReason::Forbidden => "FORBIDDEN",
            FailureReason::PermissionsMissing => "PERMISSIONS_MISSING",
            FailureReason::ClientPermissionsMissing => "CLIENT_PERMISSIONS_MISSING",
            FailureReason::GuildOnly => "GUILD_ONLY",
            FailureReason::DmOnly => "DM_ONLY",
            FailureReason::OwnerOnly => "OWNER_ONLY",
        }
    }

    /// Text shown to the invoking user.
    pub fn user_message(self) -> &'static str {
        match self {
            FailureReason::Halted => "This interaction was stopped before it could run.",
            FailureReason::HandlerMissing => "Nothing is listening for this interaction right now.",
            FailureReason::Disabled => "This command is currently disabled.",
            FailureReason::Forbidden => "You aren't allowed to use this command.",
            FailureReason::PermissionsMissing => "You're missing the permissions this command needs.",
            FailureReason::ClientPermissionsMissing => "I'm missing the permissions this command needs.",
            FailureReason::GuildOnly => "This command can only be used in a server.",
            FailureReason::DmOnly => "This command can only be used in direct messages.",
            FailureReason::OwnerOnly => "This command is restricted to the bot owner.",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[async_trait]
pub trait Reporter: Send + Sync + 'static {
    /// Called on every caught failure.
    fn report(&self, error: &AugurError, context: &ErrorContext);

    /// Called when an interaction is refused or cannot be routed.
    async fn interaction_failed(&self, icx: &InteractionContext, reason: FailureReason);
}

/// Default sink: structured log lines, ephemeral replies for interactions.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

#[async_trait]
impl Reporter for LogReporter {
    fn report(&self, error: &AugurError, context: &ErrorContext) {
        tracing::error!(context = %context, error = %error, "caught failure");
    }

    async fn interaction_failed(&self, icx: &InteractionContext, reason: FailureReason) {
        tracing::warn!(
            interaction = %icx.interaction.id,
            target = %icx.interaction.target_id(),
            reason = %reason,
            "interaction failed"
        );
        if let Err(e) = icx.respond_ephemeral(reason.user_message()).await {
            self.report(&e, &ErrorContext::Interaction(Arc::clone(&icx.interaction)));
        }
    }
}
