pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod image;
pub mod normalize;
pub mod prompt;
pub mod services;
pub mod vision;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::router()
}
