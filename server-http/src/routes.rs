use crate::handlers;
use crate::middleware::auth_middleware;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    // Watchlist routes require a bearer token
    let watchlist_routes = Router::new()
        .route(
            "/crypto/watchlist",
            get(handlers::get_watchlist).post(handlers::add_to_watchlist),
        )
        .route(
            "/crypto/watchlist/{coin_id}",
            delete(handlers::remove_from_watchlist),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Market data routes
        .route("/crypto/top", get(handlers::top_coins))
        .route("/crypto/coin/{id}", get(handlers::coin_detail))
        .merge(watchlist_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
