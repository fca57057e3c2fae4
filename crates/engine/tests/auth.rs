use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use engine::{
    AuthError, AuthGateway, Credentials, EngineError, FederatedCredential, FederatedFailure,
    FederatedLogin, IdentityProvider, ProviderError, Session, SessionStore,
    memory::MemoryProvider,
};

fn gateway() -> (AuthGateway<MemoryProvider>, Arc<MemoryProvider>, SessionStore) {
    let provider = Arc::new(MemoryProvider::new());
    let session = SessionStore::new();
    let gateway = AuthGateway::new(Arc::clone(&provider), session.clone());
    (gateway, provider, session)
}

struct ScriptedLogin(Result<FederatedCredential, FederatedFailure>);

impl FederatedLogin for ScriptedLogin {
    async fn obtain_credential(&self) -> Result<FederatedCredential, FederatedFailure> {
        self.0.clone()
    }
}

/// Answers password sign-ins only after a delay, so other calls can run
/// while one is in flight.
struct SlowSignIn {
    inner: MemoryProvider,
    delay: Duration,
}

impl IdentityProvider for SlowSignIn {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        self.inner.sign_up(email, password).await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        tokio::time::sleep(self.delay).await;
        self.inner.sign_in_with_password(email, password).await
    }

    async fn sign_in_with_credential(
        &self,
        credential: &FederatedCredential,
    ) -> Result<Session, ProviderError> {
        self.inner.sign_in_with_credential(credential).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, ProviderError> {
        self.inner.refresh(refresh_token).await
    }

    async fn sign_out(&self, credentials: &Credentials) -> Result<(), ProviderError> {
        self.inner.sign_out(credentials).await
    }
}

#[tokio::test]
async fn sign_up_then_sign_in_keeps_the_same_id() {
    let (gateway, _provider, session) = gateway();

    let created = gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap();
    assert_eq!(session.current_user(), Some(created.clone()));

    gateway.sign_out().await;
    let signed_in = gateway
        .sign_in("ada@example.com", "lovelace")
        .await
        .unwrap();

    assert_eq!(signed_in.id, created.id);
    assert_eq!(signed_in.email.as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn empty_credentials_fail_before_any_remote_call() {
    let (gateway, provider, session) = gateway();

    let err = gateway.sign_in("", "").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Auth(AuthError::InvalidCredentials(_))
    ));
    let err = gateway.sign_up("ada@example.com", "").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Auth(AuthError::InvalidCredentials(_))
    ));

    assert_eq!(provider.remote_calls(), 0);
    assert!(!session.auth_in_progress());
    assert!(!session.is_signed_in());
}

#[tokio::test]
async fn sign_up_reports_existing_account_and_weak_password() {
    let (gateway, _provider, session) = gateway();
    gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap();
    gateway.sign_out().await;

    assert_eq!(
        gateway
            .sign_up("ada@example.com", "another")
            .await
            .unwrap_err(),
        EngineError::Auth(AuthError::AccountExists)
    );
    assert!(matches!(
        gateway.sign_up("bob@example.com", "123").await,
        Err(EngineError::Auth(AuthError::InvalidCredentials(message))) if message.starts_with("WEAK_PASSWORD")
    ));
    assert!(matches!(
        gateway.sign_up("not-an-email", "lovelace").await,
        Err(EngineError::Auth(AuthError::InvalidCredentials(_)))
    ));
    assert!(!session.is_signed_in());
    assert!(!session.auth_in_progress());
}

#[tokio::test]
async fn wrong_password_is_rejected_with_provider_message() {
    let (gateway, _provider, session) = gateway();
    gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap();
    gateway.sign_out().await;

    assert_eq!(
        gateway
            .sign_in("ada@example.com", "babbage")
            .await
            .unwrap_err(),
        EngineError::Auth(AuthError::AuthRejected(
            "INVALID_LOGIN_CREDENTIALS".to_string()
        ))
    );
    assert!(!session.is_signed_in());
}

#[tokio::test]
async fn loading_flag_is_cleared_when_the_provider_is_unreachable() {
    let (gateway, provider, session) = gateway();
    provider.set_offline(true);

    let err = gateway
        .sign_in("ada@example.com", "lovelace")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::Auth(AuthError::AuthRejected(
            "network request failed".to_string()
        ))
    );
    assert!(!session.auth_in_progress());
}

#[tokio::test]
async fn subscribers_follow_the_session_lifecycle() {
    let (gateway, _provider, _session) = gateway();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let token = gateway.on_session_change(move |user| {
        sink.lock().unwrap().push(user.is_some());
    });

    gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap();
    gateway.sign_out().await;
    assert!(gateway.session().unsubscribe(token));
    gateway
        .sign_in("ada@example.com", "lovelace")
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![true, false]);
}

#[tokio::test]
async fn sign_out_during_auth_in_progress_still_signs_out() {
    let (gateway, provider, session) = gateway();
    gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap();
    session.set_auth_in_progress(true);

    gateway.sign_out().await;

    assert!(!session.is_signed_in());
    assert_eq!(session.current_user(), None);
    assert_eq!(provider.active_sessions(), 0);
}

#[tokio::test]
async fn sign_in_completing_after_sign_out_signs_back_in() {
    let provider = Arc::new(SlowSignIn {
        inner: MemoryProvider::new(),
        delay: Duration::from_millis(50),
    });
    let session = SessionStore::new();
    let gateway = AuthGateway::new(provider, session.clone());
    let created = gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    gateway.on_session_change(move |user| sink.lock().unwrap().push(user.is_some()));

    let (signed_in, ()) = tokio::join!(gateway.sign_in("ada@example.com", "lovelace"), async {
        while !session.auth_in_progress() {
            tokio::task::yield_now().await;
        }
        gateway.sign_out().await;
        assert!(!session.is_signed_in());
    });

    // Sign-out does not cancel the pending sign-in; its late result wins.
    assert_eq!(signed_in.unwrap().id, created.id);
    assert_eq!(session.current_user().map(|user| user.id), Some(created.id));
    assert!(!session.auth_in_progress());
    assert_eq!(*seen.lock().unwrap(), vec![false, true]);
}

#[tokio::test]
async fn sign_out_succeeds_locally_when_provider_fails() {
    let (gateway, provider, session) = gateway();
    gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap();
    provider.set_offline(true);

    gateway.sign_out().await;

    assert!(!session.is_signed_in());
}

#[tokio::test]
async fn federated_credential_maps_to_a_stable_account() {
    let (gateway, _provider, session) = gateway();
    let credential = FederatedCredential::google("subject-42");

    let first = gateway
        .sign_in_with_federated_credential(&credential)
        .await
        .unwrap();
    gateway.sign_out().await;
    let second = gateway
        .sign_in_federated(&ScriptedLogin(Ok(credential)))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.email, None);
    assert!(session.is_signed_in());
}

#[tokio::test]
async fn federated_failures_are_surfaced() {
    let (gateway, provider, session) = gateway();

    let cases = [
        (FederatedFailure::Cancelled, AuthError::FederatedAuthCancelled),
        (FederatedFailure::InProgress, AuthError::FederatedAuthInProgress),
        (
            FederatedFailure::ServiceUnavailable,
            AuthError::FederatedServiceUnavailable,
        ),
        (
            FederatedFailure::Other("DEVELOPER_ERROR".to_string()),
            AuthError::FederatedAuthOther("DEVELOPER_ERROR".to_string()),
        ),
    ];
    for (failure, expected) in cases {
        let err = gateway
            .sign_in_federated(&ScriptedLogin(Err(failure)))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Auth(expected));
    }

    assert_eq!(provider.remote_calls(), 0);
    assert!(!session.is_signed_in());
}

#[tokio::test]
async fn rejected_federated_token_is_reported_as_other() {
    let (gateway, _provider, _session) = gateway();

    let err = gateway
        .sign_in_with_federated_credential(&FederatedCredential::google(""))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Auth(AuthError::FederatedAuthOther(message)) if message.starts_with("INVALID_IDP_RESPONSE")
    ));
}

#[tokio::test]
async fn restore_refreshes_expired_credentials() {
    let (gateway, _provider, session) = gateway();
    gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap();
    let mut stored = session.take_session().unwrap();
    stored.credentials.expires_at = chrono::Utc::now() - chrono::Duration::minutes(5);

    let user = gateway.restore(stored.clone()).await.unwrap();

    assert_eq!(user, stored.user);
    let restored = session.current_session().unwrap();
    assert!(!restored.credentials.is_expired());
    assert_ne!(
        restored.credentials.refresh_token,
        stored.credentials.refresh_token
    );
}

#[tokio::test]
async fn restore_with_revoked_token_leaves_the_store_signed_out() {
    let (gateway, _provider, session) = gateway();
    gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap();
    let mut stored = session.current_session().unwrap();
    gateway.sign_out().await;
    stored.credentials.expires_at = chrono::Utc::now() - chrono::Duration::minutes(5);

    let err = gateway.restore(stored).await.unwrap_err();

    assert!(matches!(err, EngineError::Auth(AuthError::AuthRejected(_))));
    assert!(!session.is_signed_in());
}

#[tokio::test]
async fn restore_while_offline_keeps_the_failure_transient() {
    let (gateway, provider, session) = gateway();
    gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap();
    let mut stored = session.take_session().unwrap();
    stored.credentials.expires_at = chrono::Utc::now() - chrono::Duration::minutes(5);
    provider.set_offline(true);

    let err = gateway.restore(stored.clone()).await.unwrap_err();

    assert!(matches!(err, EngineError::Unavailable(_)));
    assert!(!session.is_signed_in());

    // Back online the same stored session is still good.
    provider.set_offline(false);
    let user = gateway.restore(stored.clone()).await.unwrap();
    assert_eq!(user, stored.user);
}

#[tokio::test]
async fn restore_refreshes_credentials_about_to_expire() {
    let (gateway, provider, session) = gateway();
    gateway
        .sign_up("ada@example.com", "lovelace")
        .await
        .unwrap();
    let mut stored = session.take_session().unwrap();
    stored.credentials.expires_at = chrono::Utc::now() + chrono::Duration::seconds(1);
    let calls = provider.remote_calls();

    gateway.restore(stored.clone()).await.unwrap();

    assert_eq!(provider.remote_calls(), calls + 1);
    let restored = session.credentials().unwrap();
    assert_ne!(restored.id_token, stored.credentials.id_token);
    assert!(!restored.is_expired());
}
