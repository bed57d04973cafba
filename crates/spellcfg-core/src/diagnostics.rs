//! Diagnostics collected while resolving settings
//!
//! Errors that must not abort a resolution (unreadable or malformed config
//! files, unresolved variables, invalid globs) are turned into
//! [`ConfigDiagnostic`] values and kept with the resolved settings so that a
//! front end can report them.

use crate::error::{ErrorKind, SettingsError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A reportable problem found while resolving settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDiagnostic {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: String,
    /// Config file the problem was found in, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl ConfigDiagnostic {
    pub fn from_error(err: &SettingsError, source: Option<&Path>) -> Self {
        let severity = match err.kind() {
            ErrorKind::UnresolvedVariable | ErrorKind::InvalidGlob => Severity::Warning,
            _ => Severity::Error,
        };
        Self {
            kind: err.kind(),
            severity,
            message: err.to_string(),
            source: source.map(Path::to_path_buf),
        }
    }
}

/// Accumulates diagnostics for a single resolution
#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollector {
    diagnostics: Vec<ConfigDiagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an absorbed error
    pub fn push(&mut self, err: &SettingsError, source: Option<&Path>) {
        warn!("{}", err);
        self.diagnostics.push(ConfigDiagnostic::from_error(err, source));
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = ConfigDiagnostic>) {
        self.diagnostics.extend(other);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigDiagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<ConfigDiagnostic> {
        self.diagnostics
    }
}
