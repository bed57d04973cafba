//! Result type alias for settings resolution

use crate::error::SettingsError;

/// Standard Result type for settings resolution
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Extension trait for Result to provide additional convenience methods
pub trait ResultExt<T> {
    /// Log the error and continue with None
    fn log_and_continue(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn log_and_continue(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                if err.is_recoverable() {
                    tracing::warn!("Continuing after error: {}", err);
                } else {
                    tracing::error!("Continuing after unexpected error: {}", err);
                }
                None
            }
        }
    }
}
