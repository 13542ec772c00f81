mod dto;
pub mod handlers;
pub mod repo;
pub mod resolver;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/foods/search", get(handlers::search_catalog))
        .route("/foods/resolve", post(handlers::resolve_food))
        .route("/foods/manual", post(handlers::create_manual_food))
        .route("/foods/derive", post(handlers::derive_food))
}
