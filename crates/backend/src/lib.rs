//! REST adapter for the managed identity and document services.
//!
//! [`Backend`] implements the engine's [`IdentityProvider`] and
//! [`DocumentStore`] ports on top of the public HTTP APIs: the identity
//! toolkit (`accounts:*`), the secure-token service (`token`) and the
//! document database (`documents`, `documents:runQuery`).
//!
//! [`IdentityProvider`]: engine::IdentityProvider
//! [`DocumentStore`]: engine::DocumentStore

pub use client::{
    Backend, BackendConfig, DEFAULT_DATABASE, DEFAULT_FIRESTORE_URL, DEFAULT_IDENTITY_URL,
    DEFAULT_TOKEN_URL,
};
pub use error::BackendError;

mod client;
mod error;
mod firestore;
mod identity;
mod values;
