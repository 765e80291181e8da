pub mod health;
pub mod issues;
pub mod modules;

use axum::Router;

use crate::state::AppState;

pub fn v1_router(state: AppState) -> Router {
    Router::new()
        .merge(modules::router(state.clone()))
        .merge(issues::router(state))
}

pub fn health_router(state: AppState) -> Router {
    health::router(state)
}
