use engine::ProviderError;
use reqwest::StatusCode;
use serde::Deserialize;

/// Identity error codes the engine treats as bad input rather than a refusal.
const INVALID_INPUT_CODES: &[&str] = &[
    "INVALID_EMAIL",
    "MISSING_EMAIL",
    "MISSING_PASSWORD",
    "WEAK_PASSWORD",
];

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The service answered with its JSON error envelope.
    #[error("{message}")]
    Api {
        status: StatusCode,
        reason: Option<String>,
        message: String,
    },
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    status: Option<String>,
}

impl BackendError {
    /// Build from a non-success response body.
    ///
    /// The document API wraps query errors in a one-element array; anything
    /// that is not an envelope keeps the raw body as message.
    pub(crate) fn from_body(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<Envelope>(body).ok().or_else(|| {
            serde_json::from_str::<Vec<Envelope>>(body)
                .ok()
                .and_then(|envelopes| envelopes.into_iter().next())
        });

        match parsed {
            Some(envelope) => Self::Api {
                status,
                reason: envelope.error.status,
                message: envelope.error.message,
            },
            None => {
                let trimmed = body.trim();
                let message = if trimmed.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    trimmed.to_string()
                };
                Self::Api {
                    status,
                    reason: None,
                    message,
                }
            }
        }
    }

    /// Leading code of an identity error, e.g. `WEAK_PASSWORD` in
    /// `WEAK_PASSWORD : Password should be at least 6 characters`.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.split(':').next().map(str::trim),
            _ => None,
        }
    }

    /// Translate an identity service failure.
    pub(crate) fn into_identity_error(self) -> ProviderError {
        let code = self.code().map(ToString::to_string);
        match code.as_deref() {
            Some("EMAIL_EXISTS") => ProviderError::AccountExists,
            Some(code) if INVALID_INPUT_CODES.contains(&code) => {
                ProviderError::InvalidCredentials(self.to_string())
            }
            _ => self.into(),
        }
    }
}

impl From<BackendError> for ProviderError {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::Network(err) => ProviderError::Unavailable(err.to_string()),
            other => ProviderError::Rejected(other.to_string()),
        }
    }
}
