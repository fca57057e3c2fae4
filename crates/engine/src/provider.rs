//! Ports to the managed backend.
//!
//! The engine never talks to the network itself: an adapter implements
//! [`IdentityProvider`] and [`DocumentStore`] (the REST adapter lives in the
//! `backend` crate, [`MemoryProvider`] keeps everything in process).
//!
//! [`MemoryProvider`]: crate::memory::MemoryProvider

use std::future::Future;

use crate::{
    ProviderError,
    document::{Document, FieldValue, Fields},
    session::{Credentials, Session},
};

/// Identity token obtained from a third-party sign-in flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FederatedCredential {
    /// Provider id as the identity service knows it, e.g. `google.com`.
    pub provider_id: String,
    pub id_token: String,
}

impl FederatedCredential {
    pub fn google(id_token: impl Into<String>) -> Self {
        Self {
            provider_id: "google.com".to_string(),
            id_token: id_token.into(),
        }
    }
}

/// Account and session operations of the identity service.
pub trait IdentityProvider: Send + Sync {
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ProviderError>> + Send;

    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ProviderError>> + Send;

    fn sign_in_with_credential(
        &self,
        credential: &FederatedCredential,
    ) -> impl Future<Output = Result<Session, ProviderError>> + Send;

    /// Exchange a refresh token for fresh credentials.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<Credentials, ProviderError>> + Send;

    fn sign_out(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// Collections of schemaless documents.
///
/// `credentials` is `None` when nobody is signed in; the provider decides
/// whether anonymous access is allowed.
pub trait DocumentStore: Send + Sync {
    /// Insert a document and return the id the provider assigned to it.
    fn insert(
        &self,
        collection: &str,
        fields: Fields,
        credentials: Option<&Credentials>,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;

    /// Every document of `collection` whose `field` equals `value`.
    ///
    /// No match yields an empty list. Order is whatever the provider returns.
    fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: FieldValue,
        credentials: Option<&Credentials>,
    ) -> impl Future<Output = Result<Vec<Document>, ProviderError>> + Send;
}

/// Outcome codes of a third-party sign-in flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FederatedFailure {
    Cancelled,
    InProgress,
    ServiceUnavailable,
    Other(String),
}

impl FederatedFailure {
    /// Classify a status code reported by the sign-in SDK.
    pub fn from_status(code: &str, message: &str) -> Self {
        match code {
            "SIGN_IN_CANCELLED" => Self::Cancelled,
            "IN_PROGRESS" => Self::InProgress,
            "PLAY_SERVICES_NOT_AVAILABLE" => Self::ServiceUnavailable,
            _ => Self::Other(message.to_string()),
        }
    }
}

/// External flow that produces a [`FederatedCredential`].
pub trait FederatedLogin: Send + Sync {
    fn obtain_credential(
        &self,
    ) -> impl Future<Output = Result<FederatedCredential, FederatedFailure>> + Send;
}
