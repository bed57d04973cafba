//! Error types and handling for settings resolution

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for settings resolution and config file updates
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Malformed on-disk settings
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigFileParse { path: PathBuf, message: String },

    /// I/O failure other than not-found while reading a config file
    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Attempted mutation of a config file format that cannot be safely rewritten
    #[error("Update for config file format not supported\nFile: {uri}")]
    UnsupportedUpdateFormat { uri: String },

    /// A `${workspaceFolder:NAME}` token with no matching folder
    #[error("Unresolved variable '{token}' in '{value}'")]
    UnresolvedVariable { token: String, value: String },

    /// Failure to obtain scope/global settings or the folder list from the host
    #[error("Host communication error: {message}")]
    HostCommunication { message: String },

    #[error("Invalid URI '{uri}': {message}")]
    InvalidUri { uri: String, message: String },

    #[error("Invalid glob '{glob}': {message}")]
    InvalidGlob { glob: String, message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    ConfigFileParse,
    ConfigFileRead,
    UnsupportedUpdateFormat,
    UnresolvedVariable,
    HostCommunication,
    InvalidUri,
    InvalidGlob,
    Io,
    Internal,
}

impl SettingsError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettingsError::ConfigFileParse { .. } => ErrorKind::ConfigFileParse,
            SettingsError::ConfigFileRead { .. } => ErrorKind::ConfigFileRead,
            SettingsError::UnsupportedUpdateFormat { .. } => ErrorKind::UnsupportedUpdateFormat,
            SettingsError::UnresolvedVariable { .. } => ErrorKind::UnresolvedVariable,
            SettingsError::HostCommunication { .. } => ErrorKind::HostCommunication,
            SettingsError::InvalidUri { .. } => ErrorKind::InvalidUri,
            SettingsError::InvalidGlob { .. } => ErrorKind::InvalidGlob,
            SettingsError::IoError { .. } => ErrorKind::Io,
            SettingsError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is absorbed during resolution (reported as a
    /// diagnostic) instead of failing the operation
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ConfigFileParse
                | ErrorKind::ConfigFileRead
                | ErrorKind::UnresolvedVariable
                | ErrorKind::InvalidGlob
                | ErrorKind::Io
        )
    }

    /// Create a config file parse error
    pub fn config_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigFileParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a config file read error
    pub fn config_read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigFileRead {
            path: path.into(),
            source,
        }
    }

    pub fn unsupported_update_format(uri: impl Into<String>) -> Self {
        Self::UnsupportedUpdateFormat { uri: uri.into() }
    }

    pub fn unresolved_variable(token: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnresolvedVariable {
            token: token.into(),
            value: value.into(),
        }
    }

    /// Create a host communication error
    pub fn host_error(message: impl Into<String>) -> Self {
        Self::HostCommunication {
            message: message.into(),
        }
    }

    pub fn invalid_uri(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            message: message.into(),
        }
    }

    pub fn invalid_glob(glob: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidGlob {
            glob: glob.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = SettingsError::config_parse_error("/x/cspell.json", "unexpected token");
        assert_eq!(err.kind(), ErrorKind::ConfigFileParse);
        assert!(err.is_recoverable());

        let err = SettingsError::host_error("connection closed");
        assert_eq!(err.kind(), ErrorKind::HostCommunication);
        assert!(!err.is_recoverable());

        let err = SettingsError::unsupported_update_format("file:///x/cspell.config.js");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_unsupported_update_message_names_file() {
        let err = SettingsError::unsupported_update_format("file:///x/cspell.yml");
        let message = err.to_string();
        assert!(message.starts_with("Update for config file format not supported"));
        assert!(message.contains("file:///x/cspell.yml"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SettingsError = io.into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
