//! Authenticated HTTP client for the Honist backend.
//!
//! [`HonistContext::build`] wires a credential store, the authentication
//! session and an [`ApiClient`] that refreshes bearer tokens before they
//! expire and retries once after a 401.

pub mod auth;
pub mod config;
pub mod context;
pub mod errors;
pub mod http;
pub mod telemetry;
pub mod token;
pub mod types;

pub use auth::{AuthSession, AuthenticationApi, FileUserStore, LoginRequest, User, UserStore};
pub use config::ClientConfig;
pub use context::HonistContext;
pub use errors::{Error, Result};
pub use http::{ApiClient, ApiRequest, DecodeMode, MultipartPart};
pub use token::{
    CredentialPair, CredentialStore, FileCredentialStore, MemoryCredentialStore, RefreshCoordinator,
    TokenRefresher,
};
pub use types::{ApiEnvelope, EmptyPayload, ListPayload, Pagination};

#[cfg(test)]
mod tests;
