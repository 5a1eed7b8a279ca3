//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, reports, visits};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Visitlog API",
        version = "1.0.0",
        description = "Visitor attendance logging and analytics REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        // Reports
        reports::student_report,
        reports::teacher_report,
        reports::student_lifetime_report,
        reports::teacher_lifetime_report,
        reports::teacher_summary,
        // Visits
        visits::list_student_visits,
        visits::list_teacher_visits,
        visits::create_student_visit,
        visits::create_teacher_visit,
        visits::exit_student_visit,
        visits::exit_teacher_visit,
        visits::check_active_student,
        visits::bulk_student_action,
        visits::bulk_teacher_action,
    ),
    components(
        schemas(
            // Reports
            crate::services::reports::Report,
            crate::services::reports::TeacherSummary,
            crate::analytics::AggregateResult,
            crate::analytics::ScalarStats,
            crate::analytics::LifetimeStats,
            crate::analytics::Series,
            crate::analytics::DateRange,
            crate::analytics::RangeShortcut,
            // Visits
            crate::models::VisitRecord,
            crate::models::VisitorDetails,
            crate::models::VisitorKind,
            crate::models::Level,
            crate::models::VisitStatus,
            crate::models::BulkActionKind,
            crate::models::visit::CreateStudentVisit,
            crate::models::visit::CreateTeacherVisit,
            crate::models::visit::VisitQuery,
            crate::models::visit::VisitPage,
            crate::models::visit::BulkActionRequest,
            crate::models::visit::BulkActionResult,
            crate::models::visit::ActiveVisitLookup,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "reports", description = "Attendance analytics"),
        (name = "visits", description = "Visit logging and administration")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
