use beacon_health::HealthResponder;

use crate::config::HttpConfig;

/// Everything the router needs, assembled once at startup.
#[derive(Clone)]
pub struct AppState {
    pub http: HttpConfig,
    /// `None` when no dependency is probed; `/health` is then not routed.
    pub health: Option<HealthResponder>,
}
