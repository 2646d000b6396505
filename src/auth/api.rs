use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::models::{AuthResult, LoginRequest, LogoutRequest, RefreshRequest, TokenPair, User};
use crate::auth::signing::{self, SIGNATURE_HEADER};
use crate::errors::Error;
use crate::http::{ApiClient, ApiRequest};
use crate::types::EmptyPayload;

const AUTH_PREFIX: &str = "/api/v1/app/auth";

/// Raw calls against the authentication endpoints.
///
/// Every request carries an `x-hmac-signature` header. The client used here
/// never refreshes on its own, so a refresh call cannot trigger another one.
#[derive(Clone)]
pub struct AuthenticationApi {
    client: ApiClient,
    hmac_secret: String,
}

impl AuthenticationApi {
    pub fn new(client: &ApiClient, hmac_secret: impl Into<String>) -> Self {
        Self {
            client: client.without_refresher(),
            hmac_secret: hmac_secret.into(),
        }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResult, Error> {
        self.signed_json("login", request).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, Error> {
        self.signed_json("refresh", &RefreshRequest { refresh_token })
            .await
    }

    pub async fn logout_current(&self, refresh_token: &str) -> Result<EmptyPayload, Error> {
        self.signed_json("logout", &LogoutRequest { refresh_token })
            .await
    }

    /// The body is `{}` but the signature covers an empty input, matching
    /// what the backend verifies for this endpoint.
    pub async fn logout_all(&self) -> Result<EmptyPayload, Error> {
        let request = ApiRequest::post(endpoint("logout-all")).json(&EmptyPayload {})?;
        self.send_signed(request, b"").await
    }

    pub async fn me(&self) -> Result<User, Error> {
        self.send_signed(ApiRequest::get(endpoint("me")), b"").await
    }

    async fn signed_json<B, T>(&self, name: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::post(endpoint(name)).json(body)?;
        let payload = request.body().bytes().to_vec();
        self.send_signed(request, &payload).await
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        signed_bytes: &[u8],
    ) -> Result<T, Error> {
        let signature = signing::sign(signed_bytes, &self.hmac_secret)?;
        debug!(path = %request.path(), "sending signed auth request");
        self.client
            .send(request.header(SIGNATURE_HEADER, signature))
            .await
    }
}

fn endpoint(name: &str) -> String {
    format!("{AUTH_PREFIX}/{name}")
}
