use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::probe::ProbeResult;
use crate::registry::HealthRegistry;

pub const ALIVE_MESSAGE: &str = "Hello, World!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatusResponse {
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ProbeResult> for ServiceStatusResponse {
    fn from(result: ProbeResult) -> Self {
        let details = match result.details {
            Value::Null => None,
            Value::Object(ref map) if map.is_empty() => None,
            details => Some(details),
        };
        Self {
            status: if result.error.is_none() {
                ServiceStatus::Up
            } else {
                ServiceStatus::Down
            },
            details,
            error: result.error,
        }
    }
}

/// Per-backend status for one `/health` call. Serializes as a plain JSON object
/// keyed by probe name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthReport(BTreeMap<String, ServiceStatusResponse>);

impl HealthReport {
    pub fn from_results(results: impl IntoIterator<Item = ProbeResult>) -> Self {
        Self(
            results
                .into_iter()
                .map(|r| (r.name.clone(), ServiceStatusResponse::from(r)))
                .collect(),
        )
    }

    pub fn is_healthy(&self) -> bool {
        self.0.values().all(|s| s.status == ServiceStatus::Up)
    }

    /// 200 when every backend is up, 500 as soon as one is down.
    pub fn status_code(&self) -> StatusCode {
        if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub fn get(&self, name: &str) -> Option<&ServiceStatusResponse> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceStatusResponse)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Renders the registry's results. Holds nothing but the shared registry.
#[derive(Clone)]
pub struct HealthResponder {
    registry: Arc<HealthRegistry>,
}

impl HealthResponder {
    pub fn new(registry: Arc<HealthRegistry>) -> Self {
        Self { registry }
    }

    pub async fn report(&self) -> HealthReport {
        HealthReport::from_results(self.registry.check_all().await)
    }

    /// `GET /health` bound to this responder, ready to merge into a route group.
    pub fn routes(self) -> Router {
        Router::new().route("/health", get(health)).with_state(self)
    }
}

/// Handler for `GET /health`: probes every backend and reports each one.
pub async fn health(State(responder): State<HealthResponder>) -> (StatusCode, Json<HealthReport>) {
    let report = responder.report().await;
    let status = report.status_code();
    if !report.is_healthy() {
        let down: Vec<&str> = report
            .iter()
            .filter(|(_, s)| s.status == ServiceStatus::Down)
            .map(|(name, _)| name)
            .collect();
        tracing::warn!(down = ?down, "dependency health check failed");
    }
    (status, Json(report))
}

/// Handler for `GET /alive`: process liveness only, no dependency probing.
pub async fn alive() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "message": ALIVE_MESSAGE })))
}
