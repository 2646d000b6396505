use std::fmt::Display;

use reqwest::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::errors::Error;
use crate::http::multipart::MultipartBody;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Vec<u8>),
    Raw {
        bytes: Vec<u8>,
        content_type: String,
    },
}

impl RequestBody {
    pub fn bytes(&self) -> &[u8] {
        match self {
            RequestBody::Empty => &[],
            RequestBody::Json(bytes) | RequestBody::Raw { bytes, .. } => bytes,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(_) => Some(JSON_CONTENT_TYPE),
            RequestBody::Raw { content_type, .. } => Some(content_type),
        }
    }
}

/// How a 2xx body maps onto the caller's type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Unwrap `ApiEnvelope<T>`, falling back to a bare `T`.
    #[default]
    Envelope,
    /// The type decodes itself from the whole body (e.g. `ListPayload`).
    Root,
}

/// One logical call: built by the caller, consumed once by the client and
/// replayed unchanged if a 401 triggers the single retry.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: RequestBody,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) decode: DecodeMode,
    pub(crate) cancel: Option<CancellationToken>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: Vec::new(),
            decode: DecodeMode::Envelope,
            cancel: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Extra header; applied after the defaults and replaces any of them.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, Error> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| Error::InvalidRequest(format!("Failed to encode body: {e}")))?;
        self.body = RequestBody::Json(bytes);
        Ok(self)
    }

    pub fn raw(mut self, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = RequestBody::Raw {
            bytes,
            content_type: content_type.into(),
        };
        self
    }

    pub fn multipart(self, body: MultipartBody) -> Self {
        self.raw(body.data, body.content_type)
    }

    pub fn from_root(mut self) -> Self {
        self.decode = DecodeMode::Root;
        self
    }

    /// Resolve the call to `Error::Cancelled` once `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }
}
