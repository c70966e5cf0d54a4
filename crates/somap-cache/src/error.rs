//! Error types for the map object pool.
//!
//! `PoolError` is what callers of the pool and the manager see. `FactoryError`
//! is what a bound constructor reports back to the pool, which decides how to
//! surface it.

use thiserror::Error;

/// Main error type for pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
    // Identity errors
    #[error("Invalid map identity field {field} = {value}: {reason}")]
    IdentityConstruction {
        field: &'static str,
        value: String,
        reason: String,
    },

    // Construction errors
    #[error("Failed to construct object ({reason}). {args}")]
    Construction {
        reason: String,
        /// Rendered positional and keyword arguments of the failed call
        args: String,
    },

    #[error("Object construction cancelled")]
    Cancelled,

    #[error("Factory error: {message}")]
    Factory {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    // Internal state errors
    #[error("Lock poisoned: {what}")]
    LockPoisoned { what: &'static str },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

impl PoolError {
    /// Build an identity error for a structural field.
    pub fn identity(field: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        PoolError::IdentityConstruction {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether a retry with the same arguments could succeed.
    ///
    /// Argument and identity errors are deterministic; cancellation and opaque
    /// factory failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PoolError::Cancelled | PoolError::Factory { .. })
    }
}

impl From<serde_json::Error> for PoolError {
    fn from(err: serde_json::Error) -> Self {
        PoolError::Config {
            message: err.to_string(),
        }
    }
}

/// Error reported by a constructor bound to a pool.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The supplied arguments do not fit the constructor's signature
    /// (arity, keyword names, value types).
    #[error("{0}")]
    ArgumentMismatch(String),

    #[error("Construction cancelled")]
    Cancelled,

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Result type alias for constructors.
pub type FactoryResult<T> = std::result::Result<T, FactoryError>;

impl FactoryError {
    pub fn mismatch(message: impl Into<String>) -> Self {
        FactoryError::ArgumentMismatch(message.into())
    }
}
