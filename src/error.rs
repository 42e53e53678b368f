//! Error types for factlens.
//!
//! All errors are strongly typed using thiserror. Lookups that find
//! nothing are not errors: they surface as `None` and leave the entity
//! unloaded. Errors are reserved for bad input, reserved member access,
//! and transport failures of the backing services.

use thiserror::Error;

/// Validation errors that occur during input validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Can't coerce {value} to Entity")]
    CannotCoerce {
        value: String,
    },

    #[error("Invalid record id: {value:?}")]
    InvalidRecordId {
        value: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Transport-level failures reported by a document or record service.
///
/// These are propagated as-is; factlens never retries.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Service unavailable: {service}")]
    Unavailable {
        service: String,
    },

    #[error("Service backend error: {message}")]
    Backend {
        message: String,
    },
}

/// Top-level error type for factlens.
#[derive(Debug, Error)]
pub enum FactError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("No such member: {name}")]
    NoSuchMember {
        name: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FactError {
    /// Creates a reserved/unknown member error.
    #[must_use]
    pub fn no_such_member(name: impl Into<String>) -> Self {
        Self::NoSuchMember { name: name.into() }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a service error.
    #[must_use]
    pub const fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }

    /// Returns true if this is a reserved member error.
    #[must_use]
    pub const fn is_no_such_member(&self) -> bool {
        matches!(self, Self::NoSuchMember { .. })
    }

    /// Returns true if retrying the same call might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Service(e) => matches!(e, ServiceError::Unavailable { .. }),
            Self::Validation(_) | Self::NoSuchMember { .. } | Self::Serialization(_) => false,
        }
    }
}

/// Result type alias for factlens operations.
pub type FactResult<T> = Result<T, FactError>;
