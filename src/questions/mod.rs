use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
mod repo;
mod repo_types;
mod services;

pub fn router() -> Router<AppState> {
    handlers::question_routes()
}
