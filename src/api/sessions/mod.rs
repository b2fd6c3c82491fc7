mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::start_session))
        .route("/:session_id", get(handlers::get_session))
        .route("/:session_id/answer", put(handlers::save_answer))
        .route("/:session_id/navigate", post(handlers::navigate))
        .route("/:session_id/doubt", post(handlers::toggle_doubt))
        .route("/:session_id/focus-loss", post(handlers::report_focus_loss))
        .route("/:session_id/finish", post(handlers::finish_session))
}
