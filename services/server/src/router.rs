use axum::Router;
use axum::http::Uri;
use axum::routing::get;

use beacon_core::error::AppError;
use beacon_core::middleware::with_request_layers;
use beacon_health::alive;

use crate::state::AppState;

async fn route_not_found(uri: Uri) -> AppError {
    AppError::NoDataFound(format!("no route for {}", uri.path()))
}

/// Build the service router: every route sits in the `/{APP_NAME}` group.
pub fn build_router(state: AppState) -> Router {
    let mut group = Router::new().route("/alive", get(alive));
    if let Some(responder) = state.health {
        group = group.merge(responder.routes());
    }

    let router = if state.http.app_name.is_empty() {
        group
    } else {
        Router::new().nest(&format!("/{}", state.http.app_name), group)
    };

    with_request_layers(router.fallback(route_not_found))
}
