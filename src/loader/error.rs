use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Role {name:?} not found (searched: {searched:?})")]
    RoleNotFound { name: String, searched: Vec<PathBuf> },

    #[error("Failed to decode tasks file {path:?}: {reason}")]
    TaskDecode { path: PathBuf, reason: String },

    #[error("Failed to read variables file {path:?}: {reason}")]
    VarsFileRead { path: PathBuf, reason: String },

    #[error("Circular role dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk role directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Why a document could not be decoded into the expected shape.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Expected {expected} at {location}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        location: String,
        found: &'static str,
    },

    #[error("Invalid value at {location}: {source}")]
    Invalid {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}
