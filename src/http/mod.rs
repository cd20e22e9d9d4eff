use axum::Router;
use tower_http::services::ServeDir;

use crate::config::UploadBackend;
use crate::AppState;

mod error;
mod extract;
mod handlers;
mod routes;
mod session;

pub use error::{resolve, AppError};
pub use extract::{AppForm, AppPath, AppQuery};
pub use session::{Viewer, SESSION_COOKIE};

pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(routes::health())
        .merge(routes::session())
        .merge(routes::reports(state.upload.max_bytes))
        .merge(routes::engagement())
        .merge(routes::moderation());

    if let UploadBackend::Local { dir, url_prefix } = &state.upload.backend {
        router = router.nest_service(url_prefix, ServeDir::new(dir));
    }

    router.with_state(state)
}
