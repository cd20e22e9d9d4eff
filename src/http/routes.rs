use axum::extract::DefaultBodyLimit;
use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

/// Room for the text fields and multipart framing around the image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn session() -> Router<AppState> {
    Router::new()
        .route("/login", get(handlers::session_status).post(handlers::login))
        .route("/admin_login", post(handlers::admin_login))
        .route("/logout", get(handlers::logout))
}

pub fn reports(upload_max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_reports))
        .route(
            "/new_report",
            get(handlers::new_report_form)
                .post(handlers::create_report)
                .layer(DefaultBodyLimit::max(upload_max_bytes + FORM_OVERHEAD_BYTES)),
        )
        .route("/report/:id", get(handlers::get_report))
        .route("/delete/:id", post(handlers::delete_report))
}

pub fn engagement() -> Router<AppState> {
    Router::new()
        .route("/like/:id", post(handlers::like_report))
        .route("/like_ajax/:id", post(handlers::like_report_ajax))
        .route("/comment/:id", post(handlers::comment_report))
        .route("/comment_ajax/:id", post(handlers::comment_report_ajax))
        .route("/delete_comment/:id", post(handlers::delete_comment))
}

pub fn moderation() -> Router<AppState> {
    Router::new()
        .route("/update_score/:id", post(handlers::update_score))
        .route("/mark_resolved/:id", post(handlers::mark_resolved))
}
