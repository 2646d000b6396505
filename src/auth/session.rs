use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::auth::api::AuthenticationApi;
use crate::auth::models::{LoginRequest, User};
use crate::auth::user_store::{MemoryUserStore, UserStore};
use crate::errors::Error;
use crate::token::{CredentialPair, CredentialStore, RefreshCoordinator, TokenRefresher, expiry};

/// Login state on top of a [`CredentialStore`].
///
/// Every refresh, whether eager, forced after a 401, or requested directly,
/// goes through one [`RefreshCoordinator`], so concurrent callers share a
/// single `/refresh` call.
pub struct AuthSession {
    store: Arc<dyn CredentialStore>,
    api: AuthenticationApi,
    coordinator: RefreshCoordinator,
    expiry_skew: Duration,
    users: Arc<dyn UserStore>,
}

impl AuthSession {
    pub fn new(store: Arc<dyn CredentialStore>, api: AuthenticationApi, expiry_skew: Duration) -> Self {
        Self {
            store,
            api,
            coordinator: RefreshCoordinator::new("auth.session"),
            expiry_skew,
            users: Arc::new(MemoryUserStore::new()),
        }
    }

    /// Replaces the in-memory user cache, e.g. with a
    /// [`FileUserStore`](crate::auth::FileUserStore) so the user survives restarts.
    pub fn with_user_store(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = users;
        self
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.access_token()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.refresh_token()
    }

    pub fn current_user(&self) -> Option<User> {
        self.users.user()
    }

    pub fn api(&self) -> &AuthenticationApi {
        &self.api
    }

    /// A missing access token counts as expired.
    pub fn is_access_token_expired(&self, skew: Duration) -> bool {
        access_token_expired(self.store.as_ref(), skew)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<User, Error> {
        let result = self.api.login(request).await?;
        self.store
            .set_pair(CredentialPair::new(result.access_token, result.refresh_token));
        info!(user_id = %result.user.id, "logged in");
        self.set_current_user(Some(result.user.clone()));
        Ok(result.user)
    }

    /// Refreshes only when the access token is missing or inside the skew
    /// window. Returns whether new tokens were stored.
    pub async fn refresh_if_needed(&self) -> Result<bool, Error> {
        if !self.is_access_token_expired(self.expiry_skew) {
            return Ok(false);
        }
        let store = Arc::clone(&self.store);
        let api = self.api.clone();
        let skew = self.expiry_skew;
        self.coordinator
            .run(move || async move {
                // Another attempt may have finished while this caller queued.
                if !access_token_expired(store.as_ref(), skew) {
                    return Ok(false);
                }
                refresh_tokens(store, api).await
            })
            .await
    }

    /// Refreshes unconditionally with the stored refresh token.
    pub async fn refresh_now(&self) -> Result<bool, Error> {
        let store = Arc::clone(&self.store);
        let api = self.api.clone();
        self.coordinator
            .run(move || refresh_tokens(store, api))
            .await
    }

    /// Revokes the current refresh token server-side, then forgets local
    /// state. Does nothing when no refresh token is stored.
    pub async fn logout_current_session(&self) -> Result<(), Error> {
        let Some(refresh_token) = self.store.refresh_token() else {
            debug!("logout skipped; no refresh token stored");
            return Ok(());
        };
        self.api.logout_current(&refresh_token).await?;
        self.forget();
        info!("logged out of current session");
        Ok(())
    }

    pub async fn logout_all_sessions(&self) -> Result<(), Error> {
        self.api.logout_all().await?;
        self.forget();
        info!("logged out of all sessions");
        Ok(())
    }

    pub async fn me_with_auto_refresh(&self) -> Result<User, Error> {
        self.refresh_if_needed().await?;
        let user = self.api.me().await?;
        self.set_current_user(Some(user.clone()));
        Ok(user)
    }

    fn forget(&self) {
        self.store.clear_all();
        self.set_current_user(None);
    }

    fn set_current_user(&self, user: Option<User>) {
        self.users.set_user(user);
    }
}

#[async_trait]
impl TokenRefresher for AuthSession {
    async fn ensure_valid_access_token_if_needed(&self) -> Result<(), Error> {
        self.refresh_if_needed().await.map(|_| ())
    }

    async fn refresh_after_unauthorized(&self, rejected_token: Option<&str>) -> Result<bool, Error> {
        if let Some(current) = self.store.access_token().filter(|t| !t.is_empty())
            && rejected_token != Some(current.as_str())
        {
            debug!("access token rotated since the request was sent; retrying without refresh");
            return Ok(true);
        }
        self.refresh_now().await
    }
}

fn access_token_expired(store: &dyn CredentialStore, skew: Duration) -> bool {
    match store.access_token() {
        Some(token) => expiry::is_expired(&token, skew),
        None => true,
    }
}

async fn refresh_tokens(store: Arc<dyn CredentialStore>, api: AuthenticationApi) -> Result<bool, Error> {
    let refresh_token = store
        .refresh_token()
        .filter(|token| !token.is_empty())
        .ok_or(Error::Unauthorized)?;
    let pair = api.refresh(&refresh_token).await?;
    store.set_pair(CredentialPair::new(pair.access_token, pair.refresh_token));
    debug!("stored refreshed token pair");
    Ok(true)
}
