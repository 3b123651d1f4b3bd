//! Configuration errors

use eb_template::TemplateError;
use std::io;
use std::path::PathBuf;

/// Errors raised while loading or reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to resolve template in '{value}': {source}")]
    Template {
        value: String,
        #[source]
        source: TemplateError,
    },

    #[error("Invalid configuration: {0}")]
    Deserialize(String),

    #[error("Environment '{0}' is not allowed to be deployed")]
    DisallowedEnvironment(String),
}
