pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    bot_token: Arc<str>,
}

impl AppState {
    pub fn new(bot_token: impl Into<Arc<str>>) -> Self {
        Self {
            bot_token: bot_token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.telegram_bot_token.as_str())
    }

    pub fn bot_token(&self) -> &str {
        &self.bot_token
    }
}

pub fn create_router(state: AppState, config: &Config) -> Router {
    let base_routes = Router::new().route("/api/health", get(routes::health::health));

    let public_api = Router::new()
        .route("/api/init", post(routes::init::init_mini_app))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.public_rps),
            middleware::rate_limit::rps_middleware,
        ));

    base_routes
        .merge(public_api)
        .with_state(state)
        .layer(middleware::cors::mini_app_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
}
