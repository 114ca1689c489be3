use axum::{routing::delete, routing::get, routing::patch, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn badges() -> Router<AppState> {
    Router::new().route("/badges", get(handlers::get_badges))
}

pub fn notifications() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(handlers::list_notifications))
        .route(
            "/notifications/unread_count",
            get(handlers::unread_count),
        )
        .route(
            "/notifications/resolve",
            get(handlers::resolve_notification_target),
        )
        .route(
            "/notifications/:id/read",
            post(handlers::mark_notification_read),
        )
        .route(
            "/notifications/read_all",
            post(handlers::mark_all_notifications_read),
        )
}

pub fn preferences() -> Router<AppState> {
    Router::new()
        .route("/preferences", get(handlers::get_preferences))
        .route("/preferences", patch(handlers::update_preferences))
}

pub fn push() -> Router<AppState> {
    Router::new()
        .route("/push/register", post(handlers::register_push))
        .route("/push/deregister", post(handlers::deregister_push))
        .route("/push/tokens", get(handlers::list_push_tokens))
}

pub fn session() -> Router<AppState> {
    Router::new().route("/session", delete(handlers::end_session))
}
