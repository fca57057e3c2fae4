//! Process-wide session state.
//!
//! [`SessionStore`] is a cheap handle: clones share the same state, so every
//! mutation is immediately visible to every holder. Nothing is persisted here;
//! front ends that want to survive a restart save the [`Session`] themselves
//! and hand it back to [`AuthGateway::restore`].
//!
//! [`AuthGateway::restore`]: crate::AuthGateway::restore

use std::sync::{
    Arc, Mutex, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};

use api_types::user::UserIdentity;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Tokens closer than this to their expiry are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 5 * 60;

/// Tokens the provider issued for a signed-in account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    /// Check if the access token is expired or will be within a few minutes.
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

/// An authenticated account together with its credentials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserIdentity,
    pub credentials: Credentials,
}

/// Returned by [`SessionStore::on_session_change`]; pass it back to
/// [`SessionStore::unsubscribe`] to stop receiving notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

type Listener = Arc<dyn Fn(Option<&UserIdentity>) + Send + Sync>;

#[derive(Default)]
struct State {
    session: Option<Session>,
    auth_in_progress: bool,
}

#[derive(Default)]
struct Inner {
    state: RwLock<State>,
    listeners: Mutex<Vec<(SubscriptionToken, Listener)>>,
    next_token: AtomicU64,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionStore")
            .field("user", &state.session.as_ref().map(|s| &s.user))
            .field("auth_in_progress", &state.auth_in_progress)
            .finish()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.read().session.as_ref().map(|s| s.user.clone())
    }

    pub fn current_session(&self) -> Option<Session> {
        self.read().session.clone()
    }

    /// Credentials of the signed-in account, read at call time.
    pub fn credentials(&self) -> Option<Credentials> {
        self.read().session.as_ref().map(|s| s.credentials.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.read().session.is_some()
    }

    pub fn auth_in_progress(&self) -> bool {
        self.read().auth_in_progress
    }

    pub fn set_auth_in_progress(&self, value: bool) {
        self.write().auth_in_progress = value;
    }

    /// Replace the current session and notify every subscriber.
    pub fn set_session(&self, session: Option<Session>) {
        let user = session.as_ref().map(|s| s.user.clone());
        self.write().session = session;
        match &user {
            Some(user) => info!("Session set for user: {}", user.id),
            None => info!("Session cleared"),
        }
        self.notify(user.as_ref());
    }

    /// Clear the current session, returning what was there.
    pub fn take_session(&self) -> Option<Session> {
        let previous = self.write().session.take();
        if previous.is_some() {
            info!("Session cleared");
            self.notify(None);
        }
        previous
    }

    /// Register a handler called with the new user after every session change.
    pub fn on_session_change<F>(&self, handler: F) -> SubscriptionToken
    where
        F: Fn(Option<&UserIdentity>) + Send + Sync + 'static,
    {
        let token = SubscriptionToken(self.inner.next_token.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((token, Arc::new(handler)));
        token
    }

    /// Returns `false` when the token was not (or no longer) registered.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != token);
        listeners.len() != before
    }

    /// Drop the session and every subscriber without notifying anyone.
    pub fn shutdown(&self) {
        {
            let mut state = self.write();
            state.session = None;
            state.auth_in_progress = false;
        }
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn notify(&self, user: Option<&UserIdentity>) {
        // Handlers run without the lock held so they may read the store.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(user);
        }
    }

    /// Mark an authentication flow as running until the guard is dropped.
    pub(crate) fn begin_auth(&self) -> AuthInProgress {
        self.set_auth_in_progress(true);
        AuthInProgress {
            store: self.clone(),
        }
    }
}

/// Clears `auth_in_progress` on drop, on success and failure alike.
pub(crate) struct AuthInProgress {
    store: SessionStore,
}

impl Drop for AuthInProgress {
    fn drop(&mut self) {
        self.store.set_auth_in_progress(false);
    }
}
