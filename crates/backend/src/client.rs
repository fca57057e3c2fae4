use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::BackendError;

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";

/// Where the managed services live and which project to talk to.
///
/// The URLs only need overriding for emulators and tests.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_key: String,
    pub project_id: String,
    pub database: String,
    pub identity_url: String,
    pub token_url: String,
    pub firestore_url: String,
}

impl BackendConfig {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
        }
    }
}

/// REST client implementing the engine's provider ports.
#[derive(Debug, Clone)]
pub struct Backend {
    pub(crate) config: BackendConfig,
    http: reqwest::Client,
}

impl Backend {
    pub fn new(config: BackendConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Reuse an existing client (timeouts, proxies and pools are its concern).
    pub fn with_client(config: BackendConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    pub(crate) fn url(base: &str, path: &str) -> String {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// POST `body` as JSON with the API key, and decode the JSON answer.
    pub(crate) async fn post_json<TReq, TResp>(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &TReq,
    ) -> Result<TResp, BackendError>
    where
        TReq: Serialize + ?Sized,
        TResp: DeserializeOwned,
    {
        debug!("POST {url}");
        let mut req = self
            .http
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(body);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<TResp>().await?);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(BackendError::from_body(status, &body))
    }
}
