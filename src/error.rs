//! Error types for configuration, service lookup and input filter construction.

use thiserror::Error;

/// Failure to build an input filter from a declarative spec
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Rule name is not registered with the factory
    #[error("Unknown validator \"{rule}\" for input \"{input}\"")]
    UnknownRule { input: String, rule: String },

    /// Filter name is not registered with the factory
    #[error("Unknown filter \"{filter}\" for input \"{input}\"")]
    UnknownFilter { input: String, filter: String },

    /// Rule or filter options could not be used
    #[error("Invalid options for \"{name}\": {reason}")]
    InvalidOptions { name: String, reason: String },
}

/// Failure of the service-lookup collaborator
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No service and no abstract factory for the name
    #[error("Service \"{0}\" not found")]
    NotFound(String),

    /// An abstract factory accepted the name but could not create it
    #[error("Unable to create service \"{name}\": {source}")]
    Creation {
        name: String,
        #[source]
        source: BuildError,
    },
}

/// Failure of the input filter registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `get` called for a name that was never resolved
    #[error("Input filter \"{0}\" not found")]
    NotFound(String),
}

/// Failure to load or validate configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Input filter spec \"{name}\" is invalid: {source}")]
    Spec {
        name: String,
        #[source]
        source: BuildError,
    },
}
