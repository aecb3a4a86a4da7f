//! Common test utilities and helpers
//!
//! Shared test infrastructure for integration tests: a metadata backend that
//! records every resource call, can be told to fail specific resources, and
//! can hold all requests, or just one kind of request, in flight until
//! released.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sqlhint::error::{ResourceError, ResourceResult};
use sqlhint::metadata::{MetadataFixture, ResourceClient};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Standard metadata used across integration tests
pub const FIXTURE: &str = r#"
default_catalog = "main"
default_schema = "default"

[[catalogs]]
name = "main"

[[catalogs.schemas]]
name = "default"

[[catalogs.schemas.tables]]
name = "orders"
columns = [
    { name = "order_id", type = "bigint" },
    { name = "customer_id", type = "bigint" },
    { name = "total", type = "decimal(12,2)" },
    { name = "created_at", type = "timestamp" },
]

[[catalogs.schemas.tables]]
name = "payments"
columns = [{ name = "payment_id", type = "bigint" }]

[[catalogs.schemas]]
name = "sales"

[[catalogs.schemas.tables]]
name = "customers"
columns = [
    { name = "customer_id", type = "bigint" },
    { name = "region", type = "string" },
]

[[catalogs]]
name = "samples"

[[catalogs.schemas]]
name = "tpch"

[[catalogs.schemas.tables]]
name = "lineitem"
columns = [{ name = "l_orderkey", type = "bigint" }]
"#;

/// Fixture-backed resource client with call recording, failure injection
/// and a pause gate
pub struct MockBackend {
    fixture: MetadataFixture,
    calls: Mutex<Vec<(String, Value)>>,
    failing: Mutex<HashSet<String>>,
    gate: watch::Sender<bool>,
    stalled: Mutex<Vec<(String, Value)>>,
    released: watch::Sender<u64>,
}

impl MockBackend {
    pub fn new(fixture: MetadataFixture) -> Arc<Self> {
        let (gate, _) = watch::channel(true);
        let (released, _) = watch::channel(0);
        Arc::new(Self {
            fixture,
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            gate,
            stalled: Mutex::new(Vec::new()),
            released,
        })
    }

    /// Number of calls made to `path`
    pub fn calls(&self, path: &str) -> usize {
        self.calls.lock().iter().filter(|(p, _)| p == path).count()
    }

    /// Number of calls made to `path` with exactly `body`
    pub fn calls_with(&self, path: &str, body: &Value) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(p, b)| p == path && b == body)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    /// Make every call to `path` fail until [`recover`](Self::recover)
    pub fn fail(&self, path: &str) {
        self.failing.lock().insert(path.to_string());
    }

    pub fn recover(&self, path: &str) {
        self.failing.lock().remove(path);
    }

    /// Hold new and pending requests until [`resume`](Self::resume)
    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    pub fn resume(&self) {
        self.gate.send_replace(true);
    }

    /// Hold calls to `path` with exactly `body` until [`release`](Self::release);
    /// every other request is served normally
    pub fn stall(&self, path: &str, body: Value) {
        self.stalled.lock().push((path.to_string(), body));
    }

    pub fn release(&self, path: &str) {
        self.stalled.lock().retain(|(p, _)| p != path);
        self.released.send_modify(|generation| *generation += 1);
    }

    fn is_stalled(&self, path: &str, body: &Value) -> bool {
        self.stalled
            .lock()
            .iter()
            .any(|(p, b)| p == path && b == body)
    }
}

#[async_trait]
impl ResourceClient for MockBackend {
    async fn post_resource(&self, path: &str, body: Value) -> ResourceResult<Value> {
        self.calls.lock().push((path.to_string(), body.clone()));

        let mut gate = self.gate.subscribe();
        let opened = gate.wait_for(|open| *open).await.is_ok();
        if !opened {
            return Err(ResourceError::Transport("backend gone".into()));
        }

        let mut released = self.released.subscribe();
        while self.is_stalled(path, &body) {
            if released.changed().await.is_err() {
                return Err(ResourceError::Transport("backend gone".into()));
            }
        }

        let failing = self.failing.lock().contains(path);
        if failing {
            return Err(ResourceError::Transport(format!("injected failure for '{path}'")));
        }
        self.fixture.post_resource(path, body).await
    }
}

/// Backend serving [`FIXTURE`]
pub fn backend() -> Arc<MockBackend> {
    MockBackend::new(MetadataFixture::from_toml(FIXTURE).expect("valid fixture"))
}

pub fn labels(items: &[sqlhint::suggest::SuggestionItem]) -> Vec<&str> {
    items.iter().map(|i| i.label.as_str()).collect()
}
