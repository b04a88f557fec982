use crate::state::DashboardState;
use axum::Router;
use axum::routing::get;
use std::sync::{Arc, RwLock};

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<RwLock<DashboardState>>) -> Router {
    Router::new()
        .route("/api/metrics", get(handlers::get_metrics))
        .route("/api/history", get(handlers::get_history))
        .route("/api/health", get(handlers::get_health))
        .with_state(state)
}
