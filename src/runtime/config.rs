//! Client configuration loaded from TOML

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use crate::error::{AugurError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub token: String,
    /// Command prefix recognized by the default parser.
    pub prefix: String,
    /// Event names the client listens to beyond the always-on set.
    pub events: Vec<String>,
    pub process_dms: bool,
    pub owner_ids: Vec<String>,
    /// Origins to register at startup. Empty means every catalogued module.
    pub modules: Vec<String>,
    /// Module-specific settings, keyed by whatever the module expects.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            prefix: "!".to_string(),
            events: Vec::new(),
            process_dms: true,
            owner_ids: Vec::new(),
            modules: Vec::new(),
            extra: HashMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| AugurError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.events.push(event.into());
        self
    }

    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events.extend(events.into_iter().map(Into::into));
        self
    }

    pub fn with_process_dms(mut self, enable: bool) -> Self {
        self.process_dms = enable;
        self
    }

    pub fn with_owner(mut self, id: impl Into<String>) -> Self {
        self.owner_ids.push(id.into());
        self
    }

    pub fn with_module(mut self, origin: impl Into<String>) -> Self {
        self.modules.push(origin.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_ids.iter().any(|id| id == user_id)
    }

    pub fn listens_to(&self, event: &str) -> bool {
        self.events.iter().any(|name| name == event)
    }

    /// Typed view of a module-specific setting.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.extra
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(|e| AugurError::Config(format!("{}: {}", key, e)))
    }
}
