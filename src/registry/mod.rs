//! The four registries a module's contributions are absorbed into

pub mod clockwork;
pub mod command;
pub mod event;
pub mod interaction;

pub use clockwork::ClockworkRegistry;
pub use command::CommandRegistry;
pub use event::EventRegistry;
pub use interaction::InteractionRegistry;
