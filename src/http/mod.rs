use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::{AuthUser, Scope};
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .merge(routes::badges())
        .merge(routes::notifications())
        .merge(routes::preferences())
        .merge(routes::push())
        .merge(routes::session())
        .with_state(state)
}
