mod handlers;
pub mod middleware;
pub mod page;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use middleware::SecurityConfig;
pub use page::PageOptions;

use crate::session::BattleSession;

/// Shared state for every handler. The mutex makes each request one whole
/// session transition.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<BattleSession>>,
    pub page: PageOptions,
}

impl AppState {
    pub fn new(session: BattleSession, page: PageOptions) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            page,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, SecurityConfig::from_env())
}

pub fn create_router_with_config(state: AppState, security: SecurityConfig) -> Router {
    let api = Router::new()
        .route("/session", get(handlers::get_session))
        .route("/session/choice", post(handlers::choose))
        .route("/session/reset", post(handlers::reset))
        .route("/leaderboard", get(handlers::get_leaderboard));

    // Everything that reads or drives the session sits behind auth
    let mut app = Router::new()
        .route("/", get(handlers::battle_page))
        .route("/choose", post(handlers::choose_form))
        .route("/reset", post(handlers::reset_form))
        .nest("/api/v1", api)
        .layer(from_fn_with_state(
            security.clone(),
            middleware::auth_middleware,
        ));

    if let Some(limiter) = security.rate_limiter.clone() {
        app = app.layer(from_fn_with_state(limiter, middleware::rate_limit_middleware));
    }

    // Health stays reachable without credentials
    app.route("/api/v1/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security.cors_layer()),
        )
        .with_state(state)
}
