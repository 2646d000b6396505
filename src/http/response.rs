use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::errors::Error;
use crate::http::request::DecodeMode;
use crate::types::{ApiEnvelope, EmptyPayload};

/// Maps a buffered response onto `T` or the matching error kind.
pub fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
    mode: DecodeMode,
) -> Result<T, Error> {
    if status == StatusCode::UNAUTHORIZED {
        return match envelope_message(body) {
            Some(message) => Err(Error::Network {
                status: status.as_u16(),
                message: Some(message),
            }),
            None => Err(Error::Unauthorized),
        };
    }

    if !status.is_success() {
        let message = match serde_json::from_slice::<ApiEnvelope<EmptyPayload>>(body) {
            Ok(envelope) => envelope.message,
            Err(_) => Some(String::from_utf8_lossy(body).into_owned()),
        };
        return Err(Error::Network {
            status: status.as_u16(),
            message,
        });
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return T::deserialize(Value::Null)
            .map_err(|_| Error::Decoding("Empty response body".into()));
    }

    match mode {
        DecodeMode::Root => serde_json::from_slice(body).map_err(Error::from),
        DecodeMode::Envelope => decode_envelope(body),
    }
}

fn envelope_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ApiEnvelope<EmptyPayload>>(body)
        .ok()?
        .message
}

fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    match unwrap_envelope(body) {
        Ok(value) => Ok(value),
        Err(err @ Error::Server { .. }) => Err(err),
        Err(err) => match serde_json::from_slice::<T>(body) {
            Ok(value) => {
                debug!("response decoded without envelope");
                Ok(value)
            }
            Err(_) => Err(err),
        },
    }
}

fn unwrap_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    let envelope: ApiEnvelope<T> = serde_json::from_slice(body)?;
    if !envelope.success {
        return Err(Error::Server {
            message: envelope.message,
        });
    }
    match envelope.data {
        Some(data) => Ok(data),
        // Types that accept `null` (EmptyPayload, Option, ()) stand in for absent data.
        None => T::deserialize(Value::Null)
            .map_err(|_| Error::Decoding("Missing `data` in envelope".into())),
    }
}
