//! HTTP route handlers.
//!
//! # Routes
//!
//! - `POST /sync` - sync an archetype to a customer metafield
//! - `POST /api/dearmykelexperience-sync` - same handler, legacy path
//! - `GET /health` - liveness check
//!
//! Any other method on the sync paths answers 405 with a JSON body.

mod sync;

use axum::{
    Router, middleware,
    routing::{MethodRouter, get, post},
};

use crate::middleware::require_app_proxy_signature;
use crate::state::AppState;

pub use sync::{method_not_allowed, sync_archetype};

/// Primary sync path.
pub const SYNC_PATH: &str = "/sync";

/// Path the storefront quiz has always posted to.
pub const LEGACY_SYNC_PATH: &str = "/api/dearmykelexperience-sync";

/// Build the router with all routes.
pub fn routes(state: &AppState) -> Router<AppState> {
    let sync_route: MethodRouter<AppState> = post(sync_archetype).fallback(method_not_allowed);

    Router::new()
        .route(SYNC_PATH, sync_route.clone())
        .route(LEGACY_SYNC_PATH, sync_route)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_app_proxy_signature,
        ))
        .route("/health", get(health))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not call Shopify.
async fn health() -> &'static str {
    "ok"
}
