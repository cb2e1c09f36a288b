//! Core module: the types a module author touches

pub mod clockwork;
pub mod command;
pub mod context;
pub mod event;
pub mod interaction;
pub mod module;
pub mod platform;
pub mod report;

pub use clockwork::ClockworkHandle;
pub use command::{Command, CommandBuilder, CommandContext, CommandInput, ParamStyle, ParsedCommand, Predicate};
pub use context::{Context, ContextBuilder};
pub use event::{
    handler, ClientEvent, DispatchOutcome, EventContext, EventRoutine, Flow, Interaction, InteractionKind, Message,
    Reaction, User,
};
pub use interaction::{InteractionCommand, InteractionCommandBuilder, InteractionContext, InteractionHandler};
pub use module::{carry, take_carried, CarriedData, Module, ModuleBuildInfo, ModuleFactory, Origin};
pub use platform::{CommandScope, InteractionResponse, Permissions, Platform, RemoteCommand};
pub use report::{ErrorContext, FailureReason, LifecycleOp, LogReporter, Reporter};
