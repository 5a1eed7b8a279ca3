//! Visitlog server
//!
//! Visitor attendance logging for students and teachers, with the
//! analytics engine that turns raw visit logs into dashboard reports.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Reports
        .route("/reports/students", get(api::reports::student_report))
        .route("/reports/students/lifetime", get(api::reports::student_lifetime_report))
        .route("/reports/teachers", get(api::reports::teacher_report))
        .route("/reports/teachers/lifetime", get(api::reports::teacher_lifetime_report))
        .route("/reports/teachers/summary", get(api::reports::teacher_summary))
        // Student visits
        .route(
            "/visits/students",
            get(api::visits::list_student_visits).post(api::visits::create_student_visit),
        )
        .route("/visits/students/:id/exit", put(api::visits::exit_student_visit))
        .route("/visits/students/bulk", post(api::visits::bulk_student_action))
        .route("/visits/active/:roll_no", get(api::visits::check_active_student))
        // Teacher visits
        .route(
            "/visits/teachers",
            get(api::visits::list_teacher_visits).post(api::visits::create_teacher_visit),
        )
        .route("/visits/teachers/:id/exit", put(api::visits::exit_teacher_visit))
        .route("/visits/teachers/bulk", post(api::visits::bulk_teacher_action))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
