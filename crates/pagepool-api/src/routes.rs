use axum::middleware as axum_middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let concurrency = state.config.limit_concurrency;

    let api = Router::new()
        .route("/", get(handlers::service_info))
        .route("/browser-pools", post(handlers::create_pool))
        .route("/browser-pools/list", get(handlers::list_pools))
        .route("/browser-pools/:id", get(handlers::get_pool).delete(handlers::delete_pool))
        .route("/browser-pools/:id/scale-up", patch(handlers::scale_up))
        .route("/browser-pools/:id/scale-down", patch(handlers::scale_down))
        .route("/sessions/actions", get(handlers::list_actions))
        .route("/sessions/new", get(handlers::new_session))
        .route("/sessions/:id", get(handlers::session_metrics))
        .route("/sessions/close/:id", patch(handlers::close_session))
        .route("/sessions/action/:id", post(handlers::dispatch_action))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), rate_limit_middleware));

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api)
        .layer(ConcurrencyLimitLayer::new(concurrency))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
