//! Augur - module lifecycle and event dispatch for chat services
//!
//! Modules bundle text commands, interaction commands, component handlers,
//! event subscriptions and a clockwork task. They can be registered, unloaded
//! and hot-reloaded at runtime without restarting the client.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod core;
pub mod registry;
pub mod runtime;
pub mod error;
pub mod logging;

#[cfg(test)]
pub(crate) mod testing;

#[doc(hidden)]
pub use inventory;

pub mod prelude {
    //! Commonly used types and traits

    pub use crate::core::{Command, CommandContext, CommandInput, ParamStyle};
    pub use crate::core::{ClientEvent, EventContext, Flow, Interaction, Message, User};
    pub use crate::core::{InteractionCommand, InteractionContext, InteractionHandler};
    pub use crate::core::{carry, take_carried, CarriedData, ClockworkHandle, Module, Origin};
    pub use crate::core::{CommandScope, InteractionResponse, Permissions, Platform};
    pub use crate::core::{Context, FailureReason, Reporter};
    pub use crate::runtime::{AugurClient, ClientBuilder, ClientConfig, ModuleManager};
    pub use crate::error::{AugurError, Result, ResultExt};
    pub use crate::module_init;
    pub use async_trait::async_trait;
}

pub use error::{AugurError, Result};
pub use core::{Context, Module, Origin};
pub use runtime::AugurClient;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

pub fn build_info() -> String {
    format!("Augur {}", VERSION)
}

pub fn runtime_check() -> Result<()> {
    if tokio::runtime::Handle::try_current().is_err() {
        return Err(AugurError::Other(
            "No Tokio runtime found. Use #[tokio::main]".to_string()
        ));
    }
    Ok(())
}
