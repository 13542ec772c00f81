mod dto;
pub mod handlers;
pub mod repo;
mod service;
pub mod streak;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/logs", post(handlers::create_log_entry))
        .route("/logs/:id", delete(handlers::delete_log_entry))
        .route("/logs/streak", get(handlers::get_streak))
}
