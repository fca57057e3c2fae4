//! Session lifecycle against an [`IdentityProvider`].
//!
//! ```text
//! SignedOut --(sign_up | sign_in | federated sign-in)--> SignedIn --(sign_out)--> SignedOut
//! ```
//!
//! A successful flow publishes the new session on the [`SessionStore`], which
//! is how subscribers learn about it. `auth_in_progress` is raised for the
//! duration of `sign_up` and `sign_in` only.

use std::sync::Arc;

use api_types::user::UserIdentity;
use tracing::{debug, warn};

use crate::{
    AuthError, EngineError, ProviderError, ResultEngine,
    provider::{FederatedCredential, FederatedFailure, FederatedLogin, IdentityProvider},
    session::{Session, SessionStore, SubscriptionToken},
    util::required,
};

const CREDENTIALS_REQUIRED: &str = "Email and Password are required!";

#[derive(Debug)]
pub struct AuthGateway<P> {
    provider: Arc<P>,
    session: SessionStore,
}

impl<P> Clone for AuthGateway<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            session: self.session.clone(),
        }
    }
}

impl<P: IdentityProvider> AuthGateway<P> {
    pub fn new(provider: Arc<P>, session: SessionStore) -> Self {
        Self { provider, session }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Subscribe to session changes; see [`SessionStore::on_session_change`].
    pub fn on_session_change<F>(&self, handler: F) -> SubscriptionToken
    where
        F: Fn(Option<&UserIdentity>) + Send + Sync + 'static,
    {
        self.session.on_session_change(handler)
    }

    /// Register a new account. The provider signs the new account in.
    pub async fn sign_up(&self, email: &str, password: &str) -> ResultEngine<UserIdentity> {
        let email = require_credentials(email, password)?;
        let _loading = self.session.begin_auth();
        debug!("signing up {email}");

        let session = self
            .provider
            .sign_up(email, password)
            .await
            .map_err(sign_up_error)?;
        Ok(self.establish(session))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ResultEngine<UserIdentity> {
        let email = require_credentials(email, password)?;
        let _loading = self.session.begin_auth();
        debug!("signing in {email}");

        let session = self
            .provider
            .sign_in_with_password(email, password)
            .await
            .map_err(sign_in_error)?;
        Ok(self.establish(session))
    }

    /// Exchange a third-party identity token for a provider session.
    pub async fn sign_in_with_federated_credential(
        &self,
        credential: &FederatedCredential,
    ) -> ResultEngine<UserIdentity> {
        debug!("signing in with {} credential", credential.provider_id);
        let session = self
            .provider
            .sign_in_with_credential(credential)
            .await
            .map_err(|err| AuthError::FederatedAuthOther(err.to_string()))?;
        Ok(self.establish(session))
    }

    /// Run the external sign-in flow, then exchange its token.
    pub async fn sign_in_federated<L: FederatedLogin>(
        &self,
        login: &L,
    ) -> ResultEngine<UserIdentity> {
        let credential = login.obtain_credential().await.map_err(|failure| {
            if let FederatedFailure::Other(message) = &failure {
                warn!("federated sign-in failed: {message}");
            }
            AuthError::from(failure)
        })?;
        self.sign_in_with_federated_credential(&credential).await
    }

    /// Re-establish a persisted session, refreshing credentials that are
    /// expired or about to expire.
    ///
    /// On failure the store is not touched. [`EngineError::Unavailable`]
    /// means the refresh never reached the provider and `stored` is worth
    /// keeping; any other error means it was refused.
    pub async fn restore(&self, stored: Session) -> ResultEngine<UserIdentity> {
        if !stored.credentials.is_expired() {
            return Ok(self.establish(stored));
        }

        debug!("refreshing credentials for {}", stored.user.id);
        let credentials = self
            .provider
            .refresh(&stored.credentials.refresh_token)
            .await
            .map_err(restore_error)?;
        Ok(self.establish(Session {
            user: stored.user,
            credentials,
        }))
    }

    /// Always succeeds locally; provider-side failures are only logged.
    pub async fn sign_out(&self) {
        let Some(previous) = self.session.take_session() else {
            return;
        };
        if let Err(err) = self.provider.sign_out(&previous.credentials).await {
            warn!("provider sign-out failed for {}: {err}", previous.user.id);
        }
    }

    fn establish(&self, session: Session) -> UserIdentity {
        let user = session.user.clone();
        self.session.set_session(Some(session));
        user
    }
}

fn require_credentials<'a>(email: &'a str, password: &str) -> ResultEngine<&'a str> {
    match required(email) {
        Some(email) if !password.is_empty() => Ok(email),
        _ => Err(AuthError::InvalidCredentials(CREDENTIALS_REQUIRED.to_string()).into()),
    }
}

fn sign_up_error(err: ProviderError) -> EngineError {
    match err {
        ProviderError::AccountExists => AuthError::AccountExists,
        ProviderError::InvalidCredentials(message) => AuthError::InvalidCredentials(message),
        ProviderError::Rejected(message) | ProviderError::Unavailable(message) => {
            AuthError::AuthRejected(message)
        }
    }
    .into()
}

fn sign_in_error(err: ProviderError) -> EngineError {
    match err {
        ProviderError::InvalidCredentials(message) => AuthError::InvalidCredentials(message),
        other => AuthError::AuthRejected(other.to_string()),
    }
    .into()
}

fn restore_error(err: ProviderError) -> EngineError {
    match err {
        ProviderError::Unavailable(message) => EngineError::Unavailable(message),
        other => AuthError::AuthRejected(other.to_string()).into(),
    }
}

impl From<FederatedFailure> for AuthError {
    fn from(value: FederatedFailure) -> Self {
        match value {
            FederatedFailure::Cancelled => Self::FederatedAuthCancelled,
            FederatedFailure::InProgress => Self::FederatedAuthInProgress,
            FederatedFailure::ServiceUnavailable => Self::FederatedServiceUnavailable,
            FederatedFailure::Other(message) => Self::FederatedAuthOther(message),
        }
    }
}
