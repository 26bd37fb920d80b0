use crate::handlers;
use crate::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(handlers::health_check))
        .route("/assignments", post(handlers::create_assignment))
        .route("/submissions", post(handlers::submit))
        .route("/submissions/:id", get(handlers::get_submission))
        .route("/submissions/:id", delete(handlers::delete_submission))
        .route(
            "/users/:user_id/assignments/:assignment_id/submissions",
            get(handlers::list_user_submissions),
        )
        .route("/users/:user_id/points", get(handlers::get_user_points))
}
