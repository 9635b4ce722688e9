//! Scripted probes.
//!
//! A [`ScriptedProbe`] reports whatever outcome the test sets and counts how
//! often it was checked, so tests can assert which endpoints touch backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use beacon_health::{Probe, ProbeError};

#[derive(Default)]
struct Shared {
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
}

#[derive(Clone)]
pub struct ScriptedProbe {
    details: Value,
    delay: Option<Duration>,
    shared: Arc<Shared>,
}

impl ScriptedProbe {
    pub fn up(details: Value) -> Self {
        Self {
            details,
            delay: None,
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn down(details: Value, error: &str) -> Self {
        let probe = Self::up(details);
        probe.fail_with(error);
        probe
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handle sharing the call counter and outcome with this probe.
    pub fn handle(&self) -> ScriptedProbe {
        self.clone()
    }

    pub fn calls(&self) -> usize {
        self.shared.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, error: &str) {
        *self.shared.failure.lock().unwrap() = Some(error.to_owned());
    }

    pub fn recover(&self) {
        *self.shared.failure.lock().unwrap() = None;
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn details(&self) -> Value {
        self.details.clone()
    }

    async fn check(&self) -> Result<(), ProbeError> {
        self.shared.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.shared.failure.lock().unwrap().clone();
        match failure {
            None => Ok(()),
            Some(error) => Err(ProbeError::Check(anyhow::Error::msg(error))),
        }
    }
}
