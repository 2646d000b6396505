use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::errors::Error;
use crate::http::multipart::{MultipartBody, MultipartPart};
use crate::http::request::ApiRequest;
use crate::http::response::decode_response;
use crate::token::{CredentialStore, TokenRefresher};
use crate::types::{EmptyPayload, ListPayload};

/// HTTP client for the backend API.
///
/// Attaches the stored access token to every request. When built with a
/// [`TokenRefresher`] it also refreshes expiring tokens before sending, and
/// retries a request exactly once after a 401 if the refresher obtained new
/// tokens.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    debug_logging: bool,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, Error> {
        config.validate()?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            http,
            base_url,
            credentials,
            refresher: None,
            debug_logging: config.debug_logging,
        })
    }

    /// Same client, with token refresh around every request.
    pub fn with_refresher(&self, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            refresher: Some(refresher),
            ..self.clone()
        }
    }

    /// Same client, sending requests exactly as given.
    pub fn without_refresher(&self) -> Self {
        Self {
            refresher: None,
            ..self.clone()
        }
    }

    pub fn has_refresher(&self) -> bool {
        self.refresher.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.send(ApiRequest::get(path)).await
    }

    /// GET for list endpoints; the payload decodes itself from the whole body.
    pub async fn get_list<I: DeserializeOwned>(&self, path: &str) -> Result<ListPayload<I>, Error> {
        self.send_list(ApiRequest::get(path)).await
    }

    pub async fn send_list<I: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<ListPayload<I>, Error> {
        self.send(request.from_root()).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.send(ApiRequest::delete(path)).await
    }

    pub async fn delete_empty(&self, path: &str) -> Result<(), Error> {
        let _: EmptyPayload = self.send(ApiRequest::delete(path)).await?;
        Ok(())
    }

    pub async fn upload_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        parts: &[MultipartPart],
    ) -> Result<T, Error> {
        if parts.is_empty() {
            return Err(Error::Upload("multipart upload needs at least one part".into()));
        }
        let body = MultipartBody::build(parts);
        self.send(ApiRequest::new(method, path).multipart(body)).await
    }

    /// Runs one logical call: eager refresh, send, at most one retry after a
    /// 401, then decode.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, Error> {
        match request.cancel.clone() {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(method = %request.method, path = %request.path, "request cancelled");
                    Err(Error::Cancelled)
                }
                result = self.dispatch(&request) => result,
            },
            None => self.dispatch(&request).await,
        }
    }

    async fn dispatch<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, Error> {
        if let Some(refresher) = &self.refresher {
            refresher.ensure_valid_access_token_if_needed().await?;
        }

        let url = self.resolve_url(request)?;
        let sent_token = self.credentials.access_token();
        let (status, body) = self
            .execute(request, &url, sent_token.as_deref(), Attempt::Initial)
            .await?;

        if status == StatusCode::UNAUTHORIZED
            && let Some(refresher) = &self.refresher
        {
            warn!(method = %request.method, url = %url, "received 401; attempting token refresh");
            match refresher
                .refresh_after_unauthorized(sent_token.as_deref())
                .await
            {
                Ok(true) => {
                    info!(method = %request.method, url = %url, "retrying request after token refresh");
                    let token = self.credentials.access_token();
                    let (status, body) = self
                        .execute(request, &url, token.as_deref(), Attempt::Retry)
                        .await?;
                    return decode_response(status, &body, request.decode);
                }
                Ok(false) => debug!("token refresh declined; surfacing original 401"),
                Err(err) => warn!(error = %err, "token refresh after 401 failed; surfacing original 401"),
            }
        }

        decode_response(status, &body, request.decode)
    }

    fn resolve_url(&self, request: &ApiRequest) -> Result<Url, Error> {
        let mut url = self
            .base_url
            .join(&request.path)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", request.path)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .query
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            );
        }
        Ok(url)
    }

    /// Builds the outgoing request with `token` as the bearer. Caller headers
    /// replace defaults, except that a retry always carries the refreshed
    /// bearer.
    fn build(
        &self,
        request: &ApiRequest,
        url: &Url,
        token: Option<&str>,
        attempt: Attempt,
    ) -> Result<reqwest::Request, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let bearer = bearer_value(token)?;
        if let Some(value) = &bearer {
            headers.insert(AUTHORIZATION, value.clone());
        }

        if let Some(content_type) = request.body.content_type() {
            let value = HeaderValue::from_str(content_type)
                .map_err(|_| Error::InvalidRequest(format!("bad content type '{content_type}'")))?;
            headers.insert(CONTENT_TYPE, value);
        }

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidRequest(format!("bad header name '{name}'")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::InvalidRequest(format!("bad value for header '{name}'")))?;
            headers.insert(name, value);
        }

        if attempt == Attempt::Retry
            && let Some(value) = bearer
        {
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .headers(headers);
        let body = request.body.bytes();
        if !body.is_empty() {
            builder = builder.body(body.to_vec());
        }
        Ok(builder.build()?)
    }

    async fn execute(
        &self,
        request: &ApiRequest,
        url: &Url,
        token: Option<&str>,
        attempt: Attempt,
    ) -> Result<(StatusCode, Vec<u8>), Error> {
        let outgoing = self.build(request, url, token, attempt)?;
        if self.debug_logging {
            log_request(&outgoing, request.body.bytes());
        }

        let response = self.http.execute(outgoing).await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if self.debug_logging {
            debug!(
                status = status.as_u16(),
                url = %url,
                body = %String::from_utf8_lossy(&body),
                "http.response"
            );
        }
        Ok((status, body))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
    Initial,
    Retry,
}

fn bearer_value(token: Option<&str>) -> Result<Option<HeaderValue>, Error> {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => HeaderValue::from_str(&format!("Bearer {token}"))
            .map(Some)
            .map_err(|_| Error::InvalidRequest("access token is not a valid header value".into())),
        None => Ok(None),
    }
}

fn log_request(request: &reqwest::Request, body: &[u8]) {
    let headers: Vec<String> = request
        .headers()
        .iter()
        .map(|(name, value)| {
            if name == AUTHORIZATION {
                format!("{name}: Bearer ***")
            } else {
                format!("{name}: {}", value.to_str().unwrap_or("<binary>"))
            }
        })
        .collect();
    debug!(
        method = %request.method(),
        url = %request.url(),
        headers = ?headers,
        body = %String::from_utf8_lossy(body),
        "http.request"
    );
}
