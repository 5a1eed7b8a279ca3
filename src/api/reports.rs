//! Dashboard report endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{visit::VisitQuery, VisitorKind},
    services::reports::{Report, TeacherSummary},
    AppState,
};

async fn range_report(state: &AppState, kind: VisitorKind, query: &VisitQuery) -> AppResult<Json<Report>> {
    let report = state
        .services
        .reports
        .build_report(kind, &query.range_request(), &query.filters())
        .await?;
    Ok(Json(report))
}

async fn lifetime_report(state: &AppState, kind: VisitorKind, query: &VisitQuery) -> AppResult<Json<Report>> {
    let report = state
        .services
        .reports
        .lifetime_report(kind, &query.filters())
        .await?;
    Ok(Json(report))
}

/// Student report over a date range
#[utoipa::path(
    get,
    path = "/reports/students",
    tag = "reports",
    params(VisitQuery),
    responses(
        (status = 200, description = "Student report", body = Report),
        (status = 400, description = "Invalid range or filter", body = crate::error::ErrorResponse)
    )
)]
pub async fn student_report(
    State(state): State<AppState>,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<Report>> {
    range_report(&state, VisitorKind::Student, &query).await
}

/// Teacher report over a date range
#[utoipa::path(
    get,
    path = "/reports/teachers",
    tag = "reports",
    params(VisitQuery),
    responses(
        (status = 200, description = "Teacher report", body = Report),
        (status = 400, description = "Invalid range or filter", body = crate::error::ErrorResponse)
    )
)]
pub async fn teacher_report(
    State(state): State<AppState>,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<Report>> {
    range_report(&state, VisitorKind::Teacher, &query).await
}

/// Student report over all history
#[utoipa::path(
    get,
    path = "/reports/students/lifetime",
    tag = "reports",
    params(VisitQuery),
    responses(
        (status = 200, description = "Lifetime student report", body = Report)
    )
)]
pub async fn student_lifetime_report(
    State(state): State<AppState>,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<Report>> {
    lifetime_report(&state, VisitorKind::Student, &query).await
}

/// Teacher report over all history
#[utoipa::path(
    get,
    path = "/reports/teachers/lifetime",
    tag = "reports",
    params(VisitQuery),
    responses(
        (status = 200, description = "Lifetime teacher report", body = Report)
    )
)]
pub async fn teacher_lifetime_report(
    State(state): State<AppState>,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<Report>> {
    lifetime_report(&state, VisitorKind::Teacher, &query).await
}

/// Teacher dashboard headline figures
#[utoipa::path(
    get,
    path = "/reports/teachers/summary",
    tag = "reports",
    responses(
        (status = 200, description = "Teacher summary", body = TeacherSummary)
    )
)]
pub async fn teacher_summary(State(state): State<AppState>) -> AppResult<Json<TeacherSummary>> {
    let summary = state.services.reports.teacher_summary().await?;
    Ok(Json(summary))
}
