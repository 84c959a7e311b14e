//! Result type alias for legacynator operations

use crate::error::LegacyError;

/// Standard Result type for legacynator operations
pub type Result<T> = std::result::Result<T, LegacyError>;

/// Extension trait for Result to provide additional convenience methods
pub trait ResultExt<T> {
    /// Log and swallow recoverable errors, pass fatal ones through
    fn recoverable(self) -> Result<Option<T>>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!("Recoverable error: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
