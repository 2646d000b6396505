use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tokio::sync::watch;

use crate::errors::Error;
use crate::telemetry::refresh::RefreshTelemetry;

type SharedOutcome = Option<Result<bool, Error>>;

#[derive(Clone)]
struct Inflight {
    telemetry: RefreshTelemetry,
    outcome: watch::Receiver<SharedOutcome>,
}

/// Serializes refresh attempts: at most one runs at a time and every caller
/// that arrives while it runs receives the same outcome.
///
/// The attempt runs on its own task, so it completes for all waiters even if
/// the caller that started it is dropped.
pub struct RefreshCoordinator {
    context: String,
    inflight: Arc<Mutex<Option<Inflight>>>,
}

enum Role {
    Leader(watch::Sender<SharedOutcome>, RefreshTelemetry),
    Waiter,
}

impl RefreshCoordinator {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            inflight: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inflight).is_some()
    }

    pub async fn run<F, Fut>(&self, operation: F) -> Result<bool, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool, Error>> + Send + 'static,
    {
        let (role, mut outcome) = {
            let mut slot = lock(&self.inflight);
            match slot.as_ref() {
                Some(inflight) => {
                    inflight.telemetry.emit_joined();
                    (Role::Waiter, inflight.outcome.clone())
                }
                None => {
                    let telemetry = RefreshTelemetry::new(self.context.clone());
                    let (tx, rx) = watch::channel(None);
                    *slot = Some(Inflight {
                        telemetry: telemetry.clone(),
                        outcome: rx.clone(),
                    });
                    (Role::Leader(tx, telemetry), rx)
                }
            }
        };

        if let Role::Leader(tx, telemetry) = role {
            let attempt = operation();
            let release = SlotRelease(Arc::clone(&self.inflight));
            tokio::spawn(async move {
                telemetry.emit_start(SystemTime::now());
                let result = attempt.await;
                // Clear before publishing: callers arriving from here on start a new attempt.
                drop(release);
                let waiters = tx.receiver_count();
                match &result {
                    Ok(refreshed) => {
                        telemetry.emit_success((*refreshed).into(), waiters, SystemTime::now())
                    }
                    Err(err) => telemetry.emit_failure(err, waiters, SystemTime::now()),
                }
                let _ = tx.send(Some(result));
            });
        }

        let shared = match outcome.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        shared.unwrap_or_else(|| {
            Err(Error::RefreshAborted(
                "refresh task ended without a result".into(),
            ))
        })
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new("token.refresh")
    }
}

struct SlotRelease(Arc<Mutex<Option<Inflight>>>);

impl Drop for SlotRelease {
    fn drop(&mut self) {
        lock(&self.0).take();
    }
}

fn lock(slot: &Mutex<Option<Inflight>>) -> MutexGuard<'_, Option<Inflight>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
