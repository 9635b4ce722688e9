use std::sync::Arc;

use axum::Router;
use serde_json::json;

use beacon_health::{HealthRegistry, HealthResponder};
use beacon_server::config::HttpConfig;
use beacon_server::router::build_router;
use beacon_server::state::AppState;
use beacon_testing::probe::ScriptedProbe;

// ── Scripted backend set ─────────────────────────────────────────────────────

pub struct Backends {
    pub broker: ScriptedProbe,
    pub relational: ScriptedProbe,
    pub cache: ScriptedProbe,
}

impl Backends {
    pub fn healthy() -> Self {
        Self {
            broker: ScriptedProbe::up(json!({"brokers": ["kafka-1:9092", "kafka-2:9092"]})),
            relational: ScriptedProbe::up(json!({"host": "pg", "port": 5432, "db": "orders"})),
            cache: ScriptedProbe::up(json!({"host": "redis", "port": 6379, "db": 0})),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.broker.calls() + self.relational.calls() + self.cache.calls()
    }

    pub fn responder(&self) -> HealthResponder {
        let registry = HealthRegistry::builder()
            .probe("broker", self.broker.handle())
            .probe("relational-store", self.relational.handle())
            .probe("cache", self.cache.handle())
            .build()
            .unwrap();
        HealthResponder::new(Arc::new(registry))
    }
}

// ── Router fixtures ──────────────────────────────────────────────────────────

pub fn http_config(app_name: &str) -> HttpConfig {
    HttpConfig {
        app_name: app_name.to_owned(),
        port: 0,
    }
}

pub fn app(app_name: &str, health: Option<HealthResponder>) -> Router {
    build_router(AppState {
        http: http_config(app_name),
        health,
    })
}

pub const TEST_APP_NAME: &str = "orders";
