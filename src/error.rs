use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Remote API error: {0}")]
    #[diagnostic(code(varausvahti::remote_api))]
    RemoteApi(String),

    #[error("Validation error: {0}")]
    #[diagnostic(code(varausvahti::validation))]
    Validation(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(varausvahti::not_found))]
    NotFound(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(varausvahti::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(varausvahti::config))]
    Config(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(varausvahti::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(varausvahti::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(varausvahti::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(varausvahti::other))]
    Other(String),
}

// Implement From for TOML serialization errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type SyncResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create remote API errors
pub fn remote_api_error(message: &str) -> Error {
    Error::RemoteApi(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

/// Helper to create not-found errors
pub fn not_found_error(message: &str) -> Error {
    Error::NotFound(message.to_string())
}

/// Helper to create other errors
#[allow(dead_code)]
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
