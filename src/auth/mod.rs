use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
mod password;
mod repo;
mod repo_types;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
