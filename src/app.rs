use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/board", get(handlers::show_board))
        .route("/hits", post(handlers::create_hit))
        .route("/hits/:id/rate", post(handlers::rate_hit))
        .route("/hits/:id/edit", post(handlers::start_edit))
        .route("/hits/:id/delete", post(handlers::delete_hit))
        .route("/admin/login", post(handlers::admin_login))
        .route("/admin/logout", post(handlers::admin_logout))
        .route("/admin/edit", post(handlers::save_edit))
        .route("/admin/edit/cancel", post(handlers::cancel_edit))
        .route("/api/hits", get(handlers::api_list_hits).post(handlers::api_create_hit))
        .route("/api/hits/reload", post(handlers::api_reload))
        .route(
            "/api/hits/:id",
            put(handlers::api_update_hit).delete(handlers::api_delete_hit),
        )
        .route("/api/hits/:id/ratings", post(handlers::api_rate_hit))
        .route("/api/stats", get(handlers::api_stats))
        .route("/api/admin/login", post(handlers::api_admin_login))
        .route("/api/admin/logout", post(handlers::api_admin_logout))
        .with_state(state)
}
