//! Error handling system

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AugurError {
    #[error("Module load failed: {0}")]
    ModuleLoad(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Registration failed: {0}")]
    Registration(String),

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Lifecycle operation failed: {0}")]
    Lifecycle(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, AugurError>;

/// Attaches where-it-happened detail to an error.
pub trait ResultExt<T> {
    fn with_module(self, origin: &str) -> Result<T>;
    fn with_event(self, event_name: &str) -> Result<T>;
    fn with_command(self, command: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_module(self, origin: &str) -> Result<T> {
        self.map_err(|e| match e {
            AugurError::ModuleLoad(msg) => AugurError::ModuleLoad(format!("{} [module: {}]", msg, origin)),
            AugurError::Registration(msg) => AugurError::Registration(format!("{} [module: {}]", msg, origin)),
            AugurError::Lifecycle(msg) => AugurError::Lifecycle(format!("{} [module: {}]", msg, origin)),
            other => AugurError::Lifecycle(format!("{} [module: {}]", other, origin)),
        })
    }

    fn with_event(self, event_name: &str) -> Result<T> {
        self.map_err(|e| match e {
            AugurError::Handler(msg) => AugurError::Handler(format!("{} [event: {}]", msg, event_name)),
            other => AugurError::Handler(format!("{} [event: {}]", other, event_name)),
        })
    }

    fn with_command(self, command: &str) -> Result<T> {
        self.map_err(|e| match e {
            AugurError::Handler(msg) => AugurError::Handler(format!("{} [command: {}]", msg, command)),
            other => AugurError::Handler(format!("{} [command: {}]", other, command)),
        })
    }
}

impl From<std::io::Error> for AugurError {
    fn from(error: std::io::Error) -> Self {
        AugurError::Io(error.to_string())
    }
}

impl From<toml::de::Error> for AugurError {
    fn from(error: toml::de::Error) -> Self {
        AugurError::Config(error.to_string())
    }
}

impl From<serde_json::Error> for AugurError {
    fn from(error: serde_json::Error) -> Self {
        AugurError::Config(error.to_string())
    }
}

#[macro_export]
macro_rules! bail {
    ($msg:literal) => {
        return Err($crate::error::AugurError::Other($msg.to_string()))
    };
    ($err:expr) => {
        return Err($crate::error::AugurError::Other($err.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::AugurError::Other(format!($fmt, $($arg)*)))
    };
}
