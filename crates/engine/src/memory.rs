//! In-process provider.
//!
//! Implements both ports with plain maps so the engine can run without a
//! network: tests, previews and demos. Rules mirror the managed service where
//! the engine depends on them (email shape, minimum password length,
//! equality filters, provider-assigned ids).

use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use api_types::user::{UserId, UserIdentity};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    ProviderError,
    document::{Document, FieldValue, Fields},
    provider::{DocumentStore, FederatedCredential, IdentityProvider},
    session::{Credentials, Session},
};

const MIN_PASSWORD_LEN: usize = 6;
const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug)]
struct Account {
    id: UserId,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Password accounts by email.
    accounts: HashMap<String, Account>,
    /// Federated accounts by `provider_id:subject`.
    federated: HashMap<String, Account>,
    /// Live refresh tokens.
    refresh_tokens: HashMap<String, UserId>,
    collections: HashMap<String, Vec<Document>>,
}

#[derive(Debug, Default)]
pub struct MemoryProvider {
    state: Mutex<MemoryState>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests that reached the provider.
    pub fn remote_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// While offline every request fails with [`ProviderError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of live refresh tokens, i.e. sessions not signed out.
    pub fn active_sessions(&self) -> usize {
        self.lock().refresh_tokens.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request(&self) -> Result<MutexGuard<'_, MemoryState>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable(
                "network request failed".to_string(),
            ));
        }
        Ok(self.lock())
    }
}

fn issue(state: &mut MemoryState, user: &UserId) -> Credentials {
    let refresh_token = format!("refresh-{}", Uuid::new_v4().simple());
    state
        .refresh_tokens
        .insert(refresh_token.clone(), user.clone());
    Credentials {
        id_token: format!("id-{}", Uuid::new_v4().simple()),
        refresh_token,
        expires_at: Utc::now() + Duration::seconds(TOKEN_LIFETIME_SECS),
    }
}

fn session_for(state: &mut MemoryState, account_id: &UserId, email: Option<&str>) -> Session {
    let credentials = issue(state, account_id);
    Session {
        user: UserIdentity {
            id: account_id.clone(),
            email: email.map(ToString::to_string),
        },
        credentials,
    }
}

fn valid_email(email: &str) -> bool {
    matches!(email.split_once('@'), Some((local, domain)) if !local.is_empty() && domain.contains('.'))
}

impl IdentityProvider for MemoryProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        let mut state = self.request()?;
        if !valid_email(email) {
            return Err(ProviderError::InvalidCredentials(
                "INVALID_EMAIL".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::InvalidCredentials(format!(
                "WEAK_PASSWORD : Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let key = email.to_lowercase();
        if state.accounts.contains_key(&key) {
            return Err(ProviderError::AccountExists);
        }

        let id = UserId::new(Uuid::new_v4().simple().to_string());
        state.accounts.insert(
            key,
            Account {
                id: id.clone(),
                email: Some(email.to_string()),
                password: Some(password.to_string()),
            },
        );
        Ok(session_for(&mut state, &id, Some(email)))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        let mut state = self.request()?;
        let found = state
            .accounts
            .get(&email.to_lowercase())
            .filter(|account| account.password.as_deref() == Some(password))
            .map(|account| (account.id.clone(), account.email.clone()));
        let Some((id, email)) = found else {
            return Err(ProviderError::Rejected(
                "INVALID_LOGIN_CREDENTIALS".to_string(),
            ));
        };
        Ok(session_for(&mut state, &id, email.as_deref()))
    }

    async fn sign_in_with_credential(
        &self,
        credential: &FederatedCredential,
    ) -> Result<Session, ProviderError> {
        let mut state = self.request()?;
        if credential.id_token.trim().is_empty() {
            return Err(ProviderError::Rejected(
                "INVALID_IDP_RESPONSE : the supplied auth credential is malformed".to_string(),
            ));
        }

        // The token stands in for the federated subject.
        let key = format!("{}:{}", credential.provider_id, credential.id_token);
        let id = state
            .federated
            .entry(key)
            .or_insert_with(|| Account {
                id: UserId::new(Uuid::new_v4().simple().to_string()),
                email: None,
                password: None,
            })
            .id
            .clone();
        Ok(session_for(&mut state, &id, None))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, ProviderError> {
        let mut state = self.request()?;
        let Some(user) = state.refresh_tokens.remove(refresh_token) else {
            return Err(ProviderError::Rejected("INVALID_REFRESH_TOKEN".to_string()));
        };
        Ok(issue(&mut state, &user))
    }

    async fn sign_out(&self, credentials: &Credentials) -> Result<(), ProviderError> {
        let mut state = self.request()?;
        state.refresh_tokens.remove(&credentials.refresh_token);
        Ok(())
    }
}

impl DocumentStore for MemoryProvider {
    async fn insert(
        &self,
        collection: &str,
        fields: Fields,
        _credentials: Option<&Credentials>,
    ) -> Result<String, ProviderError> {
        let mut state = self.request()?;
        let id = Uuid::new_v4().simple().to_string();
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });
        Ok(id)
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: FieldValue,
        _credentials: Option<&Credentials>,
    ) -> Result<Vec<Document>, ProviderError> {
        let state = self.request()?;
        let matches = state
            .collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| document.fields.get(field) == Some(&value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(valid_email("ada@example.com"));
        assert!(!valid_email("ada"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("ada@localhost"));
    }

    #[tokio::test]
    async fn refresh_rotates_the_token() {
        let provider = MemoryProvider::new();
        let session = provider.sign_up("ada@example.com", "secret1").await.unwrap();

        let fresh = provider
            .refresh(&session.credentials.refresh_token)
            .await
            .unwrap();
        assert_ne!(fresh.refresh_token, session.credentials.refresh_token);
        assert_eq!(
            provider.refresh(&session.credentials.refresh_token).await,
            Err(ProviderError::Rejected("INVALID_REFRESH_TOKEN".to_string()))
        );
    }

    #[tokio::test]
    async fn query_matches_on_equality_only() {
        let provider = MemoryProvider::new();
        for owner in ["u1", "u2", "u10"] {
            provider
                .insert(
                    "trips",
                    Fields::from([("userId".to_string(), FieldValue::from(owner))]),
                    None,
                )
                .await
                .unwrap();
        }

        let found = provider
            .query_eq("trips", "userId", FieldValue::from("u1"), None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let none = provider
            .query_eq("missing", "userId", FieldValue::from("u1"), None)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn offline_requests_fail_and_are_counted() {
        let provider = MemoryProvider::new();
        provider.set_offline(true);
        let err = provider
            .insert("trips", Fields::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
        assert_eq!(provider.remote_calls(), 1);
    }
}
