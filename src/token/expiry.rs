//! Expiry inspection for compact bearer tokens.
//!
//! Only the payload segment is read; signatures are never checked. A token
//! whose payload cannot be decoded, or that carries no `exp`, is reported as
//! not expired so refresh frequency stays driven by the server's 401s.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use serde_json::{Map, Value};

pub const DEFAULT_EXPIRY_SKEW: Duration = Duration::from_secs(30);

/// Decodes the payload (second segment) of a compact token into a JSON object.
pub fn decode_payload(token: &str) -> Option<Map<String, Value>> {
    let segment = token.split('.').nth(1)?;
    let mut b64: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let remainder = b64.len() % 4;
    if remainder != 0 {
        b64.extend(std::iter::repeat_n('=', 4 - remainder));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.as_bytes())
        .ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Returns the `exp` claim in seconds since the epoch, if present and numeric.
pub fn expiration(token: &str) -> Option<f64> {
    decode_payload(token)?.get("exp")?.as_f64()
}

pub fn is_expired(token: &str, skew: Duration) -> bool {
    is_expired_at(token, skew, SystemTime::now())
}

pub fn is_expired_at(token: &str, skew: Duration, now: SystemTime) -> bool {
    let Some(exp) = expiration(token) else {
        return false;
    };
    let now = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64();
    now + skew.as_secs_f64() >= exp
}
