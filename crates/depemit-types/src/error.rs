use thiserror::Error;

use crate::identity::ListenerId;

/// Errors raised synchronously when a listener is registered.
///
/// Registration validates everything up front, so a returned error means
/// the dependency graph was left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("listener {listener} cannot depend on itself")]
    SelfReference { listener: ListenerId },
}

impl RegistrationError {
    /// Stable machine-readable marker for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::SelfReference { .. } => "SELF_REFERENCE",
        }
    }
}

/// Convenience alias for registration results.
pub type RegistrationResult<T> = Result<T, RegistrationError>;
