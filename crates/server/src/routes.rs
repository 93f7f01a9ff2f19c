//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{get, patch};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (intentionally unauthenticated for load balancers/k8s probes)
        .route("/v1/health", get(handlers::health_check))
        .route(
            "/v1/profile",
            get(handlers::get_profile).put(handlers::put_profile),
        )
        .route(
            "/v1/portfolio/{collection}",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/v1/portfolio/public/{slug}/{collection}",
            get(handlers::list_public_items),
        )
        // Static segment wins over `{id}` in the router.
        .route(
            "/v1/portfolio/{collection}/metadata",
            get(handlers::get_metadata).put(handlers::put_metadata),
        )
        .route(
            "/v1/portfolio/{collection}/{id}",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route(
            "/v1/portfolio/{collection}/{id}/reorder",
            patch(handlers::reorder_item),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
