//! Runtime: module lifecycle, configuration and the client loop

pub mod catalog;
pub mod client;
pub mod config;
pub mod intents;
pub mod manager;
pub mod parse;

pub use catalog::ModuleCatalog;
pub use client::{AugurClient, ClientBuilder};
pub use config::ClientConfig;
pub use intents::GatewayIntents;
pub use manager::{ModuleManager, ModuleState};
pub use parse::{Parser, PrefixParser};
