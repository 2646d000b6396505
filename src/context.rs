use std::sync::Arc;

use tracing::info;

use crate::auth::{AuthSession, AuthenticationApi, MemoryUserStore, UserStore};
use crate::config::ClientConfig;
use crate::errors::Error;
use crate::http::ApiClient;
use crate::token::CredentialStore;

/// Everything feature code needs to talk to the backend, wired in one step.
#[derive(Clone)]
pub struct HonistContext {
    config: ClientConfig,
    credentials: Arc<dyn CredentialStore>,
    auth: Arc<AuthSession>,
    api: ApiClient,
}

impl HonistContext {
    pub fn build(config: ClientConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, Error> {
        Self::build_with_user_store(config, credentials, Arc::new(MemoryUserStore::new()))
    }

    /// Like [`build`](Self::build), with the signed-in user kept in `users`.
    pub fn build_with_user_store(
        config: ClientConfig,
        credentials: Arc<dyn CredentialStore>,
        users: Arc<dyn UserStore>,
    ) -> Result<Self, Error> {
        let bare = ApiClient::new(&config, Arc::clone(&credentials))?;
        let auth_api = AuthenticationApi::new(&bare, config.hmac_secret.clone());
        let auth = Arc::new(
            AuthSession::new(Arc::clone(&credentials), auth_api, config.token_expiry_skew())
                .with_user_store(users),
        );
        let api = bare.with_refresher(auth.clone());
        info!(base_url = %api.base_url(), "client context ready");
        Ok(Self {
            config,
            credentials,
            auth,
            api,
        })
    }

    /// Refreshing client for protected endpoints.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> Arc<AuthSession> {
        Arc::clone(&self.auth)
    }

    pub fn credentials(&self) -> Arc<dyn CredentialStore> {
        Arc::clone(&self.credentials)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MemoryCredentialStore;

    #[test]
    fn shared_client_always_has_a_refresher() {
        let context = HonistContext::build(
            ClientConfig::new("https://api.example.test"),
            Arc::new(MemoryCredentialStore::new()),
        )
        .unwrap();
        assert!(context.api().has_refresher());
        assert!(context.auth().current_user().is_none());
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = HonistContext::build(
            ClientConfig::new("not a url"),
            Arc::new(MemoryCredentialStore::new()),
        );
        assert!(matches!(result, Err(Error::InvalidUrl(_)) | Err(Error::Config(_))));
    }
}
