use std::sync::{Arc, Mutex};

use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use tracing::subscriber::{DefaultGuard, set_default};
use tracing_subscriber::{Registry, fmt, layer::SubscriberExt};
use wiremock::MockServer;

use crate::config::ClientConfig;
use crate::context::HonistContext;
use crate::token::{CredentialPair, MemoryCredentialStore};

pub const HMAC_SECRET: &str = "test-hmac-secret";

/// HS256 token whose `exp` lies `exp_offset_secs` from now.
pub fn mint_token(exp_offset_secs: i64) -> String {
    let claims = json!({
        "sub": "user-1",
        "exp": jiff::Timestamp::now().as_second() + exp_offset_secs,
        "jti": uuid::Uuid::new_v4().to_string(),
    });
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"signing-key"),
    )
    .unwrap()
}

pub fn envelope(data: Value) -> Value {
    json!({"success": true, "data": data})
}

pub fn context(server: &MockServer, pair: CredentialPair) -> HonistContext {
    let config = ClientConfig::new(server.uri())
        .with_hmac_secret(HMAC_SECRET)
        .with_debug_logging(true);
    HonistContext::build(config, Arc::new(MemoryCredentialStore::with_pair(pair))).unwrap()
}

struct VecWriter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl std::io::Write for VecWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.lines.lock().unwrap();
        guard.push(String::from_utf8_lossy(buf).into_owned());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn make_subscriber(lines: Arc<Mutex<Vec<String>>>) -> impl tracing::Subscriber + Send + Sync {
    let writer_lines = lines.clone();
    Registry::default().with(
        fmt::Layer::default()
            .with_writer(move || VecWriter {
                lines: writer_lines.clone(),
            })
            .with_target(false)
            .with_level(true)
            .with_ansi(false),
    )
}

pub fn capture_logs() -> (Arc<Mutex<Vec<String>>>, DefaultGuard) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let guard = set_default(make_subscriber(lines.clone()));
    (lines, guard)
}

pub fn drain_logs(lines: Arc<Mutex<Vec<String>>>) -> Vec<String> {
    std::mem::take(&mut *lines.lock().unwrap())
}
