//! Client-side data access and session state for trip expense tracking.
//!
//! The engine is made of four parts, all sharing one [`SessionStore`]:
//!
//! - [`SessionStore`]: who is signed in, and whether an authentication flow
//!   is running.
//! - [`AuthGateway`]: sign-up, sign-in (password or federated) and sign-out.
//! - [`TripRepository`]: trips, listed per owner.
//! - [`ExpenseRepository`]: expenses, listed per trip.
//!
//! Persistence and identity are delegated to a provider through the ports
//! in [`provider`]; [`memory::MemoryProvider`] is an in-process one.

pub use api_types::{
    expense::{Amount, Expense, ExpenseId},
    trip::{Trip, TripId},
    user::{UserId, UserIdentity},
};
pub use auth::AuthGateway;
pub use document::{Document, FieldValue, Fields};
pub use error::{AuthError, EngineError, ProviderError};
pub use expenses::ExpenseRepository;
pub use provider::{
    DocumentStore, FederatedCredential, FederatedFailure, FederatedLogin, IdentityProvider,
};
pub use session::{Credentials, Session, SessionStore, SubscriptionToken};
pub use trips::TripRepository;

mod auth;
mod document;
mod error;
mod expenses;
pub mod memory;
pub mod provider;
mod session;
mod trips;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
