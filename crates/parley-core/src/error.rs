//! Error types raised by converters.

use thiserror::Error;

/// Errors a converter may raise while resolving a token.
///
/// Returning `Ok(None)` from a converter means "this token is not a match"
/// and is not an error. A `ConvertError` aborts the whole parse.
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    /// A service the converter depends on was not attached to the context.
    #[error("service not available: '{0}'")]
    ServiceNotFound(&'static str),

    /// An external lookup (cache, network request, ...) failed.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// Custom converter error.
    #[error("{0}")]
    Custom(String),
}

impl ConvertError {
    /// Creates a lookup error.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Creates a custom converter error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for converter operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
