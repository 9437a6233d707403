use std::{error::Error, fmt, result};

pub type Result<T, E = MigrationError> = result::Result<T, E>;

#[derive(Debug)]
pub enum MigrationError {
    Internal(String),
    /// A source layer declared a type the target system has no counterpart for.
    UnrecognizedType(String),
    /// A required field of a source record is missing or has an unusable value.
    MalformedRecord {
        record: String,
        path: String,
    },
    Projection(String),
    Transport(String),
    SerDe(String),
    Config(String),
}

impl MigrationError {
    /// Errors which end the whole run. Everything else only costs the record being migrated.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MigrationError::Transport(_) | MigrationError::Config(_))
    }

    pub(crate) fn malformed(record: impl Into<String>, path: impl Into<String>) -> Self {
        MigrationError::MalformedRecord {
            record: record.into(),
            path: path.into(),
        }
    }
}

impl Error for MigrationError {}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MigrationError::Internal(s) => write!(f, "Unexpected internal error: {}", s),
            MigrationError::UnrecognizedType(s) => write!(f, "Unable to migrate layer of type {}", s),
            MigrationError::MalformedRecord { record, path } => write!(
                f,
                "Record {} is missing required field {} or its value is invalid",
                record, path
            ),
            MigrationError::Projection(s) => write!(f, "Projection error: {}", s),
            MigrationError::Transport(s) => write!(f, "Transport error: {}", s),
            MigrationError::SerDe(s) => write!(f, "SerDe related error: {}", s),
            MigrationError::Config(s) => write!(f, "Invalid configuration: {}", s),
        }
    }
}

impl From<serde_json::Error> for MigrationError {
    fn from(e: serde_json::Error) -> Self {
        MigrationError::SerDe(e.to_string())
    }
}

impl From<serde_yaml::Error> for MigrationError {
    fn from(e: serde_yaml::Error) -> Self {
        MigrationError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for MigrationError {
    fn from(e: reqwest::Error) -> Self {
        MigrationError::Transport(e.to_string())
    }
}

impl From<url::ParseError> for MigrationError {
    fn from(e: url::ParseError) -> Self {
        MigrationError::Config(e.to_string())
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(e: std::io::Error) -> Self {
        MigrationError::Config(e.to_string())
    }
}

impl From<walkdir::Error> for MigrationError {
    fn from(e: walkdir::Error) -> Self {
        MigrationError::Config(e.to_string())
    }
}

impl From<proj4rs::errors::Error> for MigrationError {
    fn from(e: proj4rs::errors::Error) -> Self {
        MigrationError::Projection(e.to_string())
    }
}
