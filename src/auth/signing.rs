use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::Error;

pub const SIGNATURE_HEADER: &str = "x-hmac-signature";

/// Lowercase hex HMAC-SHA256 of `body` keyed with `secret`.
pub fn sign(body: &[u8], secret: &str) -> Result<String, Error> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Config(format!("Invalid HMAC secret: {e}")))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
