use async_trait::async_trait;

use crate::errors::Error;

/// Token lifecycle hooks the HTTP client calls around protected requests.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Called before each request; refreshes when the access token is
    /// missing or about to expire. An error aborts the request.
    async fn ensure_valid_access_token_if_needed(&self) -> Result<(), Error>;

    /// Called once after a 401 with the stored access token the rejected
    /// request was built from. `Ok(true)` means newer tokens are stored and
    /// the request should be retried.
    async fn refresh_after_unauthorized(&self, rejected_token: Option<&str>) -> Result<bool, Error>;
}
