//! The module contains the errors the engine can return.
//!
//! Every operation of the engine surfaces one [`EngineError`]:
//!
//! - [`Validation`] when a required local input is missing; raised before any
//!   remote call is attempted.
//! - [`Auth`] for anything that went wrong while establishing a session.
//! - [`WriteFailed`] / [`ReadFailed`] when the provider rejected or failed a
//!   document write or query. The provider's text is carried verbatim so it
//!   can be displayed as is.
//! - [`Unavailable`] when a stored session could not be refreshed because
//!   the provider was unreachable. The stored session is still valid.
//!
//! Provider adapters speak [`ProviderError`]; the gateway and the
//! repositories translate it into the taxonomy above.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Auth`]: EngineError::Auth
//!  [`WriteFailed`]: EngineError::WriteFailed
//!  [`ReadFailed`]: EngineError::ReadFailed
//!  [`Unavailable`]: EngineError::Unavailable
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    WriteFailed(String),
    #[error("{0}")]
    ReadFailed(String),
    #[error("provider unreachable: {0}")]
    Unavailable(String),
}

/// Failures of the authentication flows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("an account already exists for this email")]
    AccountExists,
    #[error("{0}")]
    AuthRejected(String),
    #[error("sign-in was cancelled")]
    FederatedAuthCancelled,
    #[error("a sign-in is already in progress")]
    FederatedAuthInProgress,
    #[error("the federated sign-in service is not available")]
    FederatedServiceUnavailable,
    #[error("{0}")]
    FederatedAuthOther(String),
}

/// Error returned by a provider adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("an account already exists for this email")]
    AccountExists,
    /// Malformed email, missing field or password policy violation.
    #[error("{0}")]
    InvalidCredentials(String),
    /// The provider answered and refused the request.
    #[error("{0}")]
    Rejected(String),
    /// The provider could not be reached.
    #[error("{0}")]
    Unavailable(String),
}
