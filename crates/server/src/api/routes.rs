use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use super::{convert, handlers, jobs, middleware::metrics_middleware, upload, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let max_upload = state.config().server.max_upload_bytes;
    let output_dir = state.output_dir().to_path_buf();

    // API routes
    let api_routes = Router::new()
        // Health and metrics
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Files
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(max_upload)),
        )
        .nest_service("/download", ServeDir::new(output_dir))
        // Synchronous conversion
        .route("/convert/{domain}", post(convert::convert))
        // Background jobs: POST takes a domain, GET and DELETE a job id
        .route(
            "/jobs/{id}",
            get(jobs::get_job)
                .post(jobs::submit_job)
                .delete(jobs::cancel_job),
        )
        // Queue
        .route("/queue", get(jobs::queue_status).delete(jobs::clear_queue))
        // Live events
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
