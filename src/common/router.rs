use std::sync::Arc;

use axum::{Router, middleware::from_fn};
use tower_http::cors::CorsLayer;

use crate::{
    common::app_state::AppState, custom_questions::handlers::custom_questions_routes,
    health::handlers::health_routes, mw::request_mw::request_mw,
};

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/health", health_routes(state.clone()))
        .nest("/api/custom-questions", custom_questions_routes(state))
        .layer(from_fn(request_mw))
        .layer(CorsLayer::permissive())
}
