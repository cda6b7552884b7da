//! Error types for the configuration registry

use std::fmt;

use thiserror::Error;

use crate::value::ValueKind;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    MissingVariables(#[from] MissingVariables),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid value for {kind} variable {name}")]
    InvalidValue { name: String, kind: ValueKind },

    #[error("Unknown value kind: {0}")]
    UnknownKind(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config_crate::ConfigError),
}

/// Stable error category, for matching without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingVariables,
    InvalidArgument,
    InvalidValue,
    UnknownKind,
    Settings,
}

impl RegistryError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::MissingVariables(_) => ErrorKind::MissingVariables,
            RegistryError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RegistryError::InvalidValue { .. } => ErrorKind::InvalidValue,
            RegistryError::UnknownKind(_) => ErrorKind::UnknownKind,
            RegistryError::Settings(_) => ErrorKind::Settings,
        }
    }

    /// Whether this error reports unregistered configuration variables
    pub fn is_missing_variables(&self) -> bool {
        self.kind() == ErrorKind::MissingVariables
    }

    /// The missing variable report, if this is a missing-variables error
    pub fn missing_variables(&self) -> Option<&MissingVariables> {
        match self {
            RegistryError::MissingVariables(missing) => Some(missing),
            _ => None,
        }
    }
}

/// Names of configuration variables that were expected but not registered,
/// in the order they were checked.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingVariables {
    pub names: Vec<String>,
}

impl MissingVariables {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// `Ok(())` when nothing is missing, otherwise the report as an error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::MissingVariables(self))
        }
    }
}

impl fmt::Display for MissingVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing configuration variables: ")?;
        if self.names.is_empty() {
            return write!(f, "none");
        }
        write!(f, "{}", self.names.join(", "))
    }
}
