//! Identity toolkit and secure-token endpoints.

use api_types::user::{UserId, UserIdentity};
use chrono::{Duration, Utc};
use engine::{Credentials, FederatedCredential, IdentityProvider, ProviderError, Session};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{client::Backend, error::BackendError};

/// Redirect URI the identity toolkit expects for token-based IdP sign-in.
const IDP_REQUEST_URI: &str = "http://localhost";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

fn credentials(
    id_token: String,
    refresh_token: String,
    expires_in: &str,
) -> Result<Credentials, BackendError> {
    let seconds = expires_in
        .parse::<i64>()
        .map_err(|_| BackendError::Decode(format!("invalid expiresIn: {expires_in}")))?;
    Ok(Credentials {
        id_token,
        refresh_token,
        expires_at: Utc::now() + Duration::seconds(seconds),
    })
}

impl AuthResponse {
    fn into_session(self) -> Result<Session, BackendError> {
        let credentials = credentials(self.id_token, self.refresh_token, &self.expires_in)?;
        Ok(Session {
            user: UserIdentity {
                id: UserId::new(self.local_id),
                email: self.email.filter(|email| !email.is_empty()),
            },
            credentials,
        })
    }
}

/// Form-encoded `postBody` of an IdP sign-in.
fn idp_post_body(credential: &FederatedCredential) -> Result<String, BackendError> {
    let url = Url::parse_with_params(
        IDP_REQUEST_URI,
        &[
            ("id_token", credential.id_token.as_str()),
            ("providerId", credential.provider_id.as_str()),
        ],
    )
    .map_err(|err| BackendError::Decode(err.to_string()))?;
    Ok(url.query().unwrap_or_default().to_string())
}

impl Backend {
    async fn password_call(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        let url = Self::url(&self.config.identity_url, endpoint);
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        self.post_json::<_, AuthResponse>(&url, None, &request)
            .await
            .and_then(AuthResponse::into_session)
            .map_err(BackendError::into_identity_error)
    }
}

impl IdentityProvider for Backend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        self.password_call("accounts:signUp", email, password).await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        self.password_call("accounts:signInWithPassword", email, password)
            .await
    }

    async fn sign_in_with_credential(
        &self,
        credential: &FederatedCredential,
    ) -> Result<Session, ProviderError> {
        let url = Self::url(&self.config.identity_url, "accounts:signInWithIdp");
        let request = IdpRequest {
            post_body: idp_post_body(credential)?,
            request_uri: IDP_REQUEST_URI,
            return_idp_credential: true,
            return_secure_token: true,
        };
        self.post_json::<_, AuthResponse>(&url, None, &request)
            .await
            .and_then(AuthResponse::into_session)
            .map_err(BackendError::into_identity_error)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, ProviderError> {
        let url = Self::url(&self.config.token_url, "token");
        let request = RefreshRequest {
            grant_type: "refresh_token",
            refresh_token,
        };
        let response = self
            .post_json::<_, RefreshResponse>(&url, None, &request)
            .await
            .map_err(BackendError::into_identity_error)?;
        Ok(credentials(
            response.id_token,
            response.refresh_token,
            &response.expires_in,
        )?)
    }

    /// Tokens are bearer-only: signing out means forgetting them, which the
    /// session store already did.
    async fn sign_out(&self, _credentials: &Credentials) -> Result<(), ProviderError> {
        debug!("discarding provider tokens");
        Ok(())
    }
}
