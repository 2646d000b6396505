#![allow(dead_code)]

use std::sync::{Arc, Once};

use honist_client::{ClientConfig, CredentialPair, HonistContext, MemoryCredentialStore};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use wiremock::MockServer;

pub const HMAC_SECRET: &str = "integration-secret";

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub fn mint_token(exp_offset_secs: i64) -> String {
    let claims = json!({
        "sub": "integration-user",
        "exp": jiff::Timestamp::now().as_second() + exp_offset_secs,
        "jti": uuid::Uuid::new_v4().to_string(),
    });
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"integration-key"),
    )
    .unwrap()
}

pub fn envelope(data: Value) -> Value {
    json!({"success": true, "data": data})
}

pub fn context(server: &MockServer, pair: CredentialPair) -> HonistContext {
    init_logging();
    let config = ClientConfig::new(server.uri())
        .with_hmac_secret(HMAC_SECRET)
        .with_debug_logging(true);
    HonistContext::build(config, Arc::new(MemoryCredentialStore::with_pair(pair))).unwrap()
}
