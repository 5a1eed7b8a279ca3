//! Visit lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        visit::{
            ActiveVisitLookup, BulkActionRequest, BulkActionResult, CreateStudentVisit,
            CreateTeacherVisit, VisitPage, VisitQuery,
        },
        VisitRecord, VisitorKind,
    },
    AppState,
};

/// List student visits
#[utoipa::path(
    get,
    path = "/visits/students",
    tag = "visits",
    params(VisitQuery),
    responses(
        (status = 200, description = "Student visits, newest first", body = VisitPage)
    )
)]
pub async fn list_student_visits(
    State(state): State<AppState>,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<VisitPage>> {
    let page = state.services.visits.list(VisitorKind::Student, &query).await?;
    Ok(Json(page))
}

/// List teacher visits
#[utoipa::path(
    get,
    path = "/visits/teachers",
    tag = "visits",
    params(VisitQuery),
    responses(
        (status = 200, description = "Teacher visits, newest first", body = VisitPage)
    )
)]
pub async fn list_teacher_visits(
    State(state): State<AppState>,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<VisitPage>> {
    let page = state.services.visits.list(VisitorKind::Teacher, &query).await?;
    Ok(Json(page))
}

/// Record a student entry
#[utoipa::path(
    post,
    path = "/visits/students",
    tag = "visits",
    request_body = CreateStudentVisit,
    responses(
        (status = 201, description = "Visit recorded", body = VisitRecord),
        (status = 400, description = "Missing or invalid field", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_student_visit(
    State(state): State<AppState>,
    Json(data): Json<CreateStudentVisit>,
) -> AppResult<(StatusCode, Json<VisitRecord>)> {
    let record = state.services.visits.record_student_entry(&data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Record a teacher entry
#[utoipa::path(
    post,
    path = "/visits/teachers",
    tag = "visits",
    request_body = CreateTeacherVisit,
    responses(
        (status = 201, description = "Visit recorded", body = VisitRecord),
        (status = 400, description = "Missing or invalid field", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_teacher_visit(
    State(state): State<AppState>,
    Json(data): Json<CreateTeacherVisit>,
) -> AppResult<(StatusCode, Json<VisitRecord>)> {
    let record = state.services.visits.record_teacher_entry(&data).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Mark a student visit as exited
#[utoipa::path(
    put,
    path = "/visits/students/{id}/exit",
    tag = "visits",
    params(("id" = i32, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Exit recorded", body = VisitRecord),
        (status = 404, description = "Visit not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Visit already exited", body = crate::error::ErrorResponse)
    )
)]
pub async fn exit_student_visit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<VisitRecord>> {
    let record = state.services.visits.mark_exit(VisitorKind::Student, id).await?;
    Ok(Json(record))
}

/// Mark a teacher visit as exited
#[utoipa::path(
    put,
    path = "/visits/teachers/{id}/exit",
    tag = "visits",
    params(("id" = i32, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Exit recorded", body = VisitRecord),
        (status = 404, description = "Visit not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Visit already exited", body = crate::error::ErrorResponse)
    )
)]
pub async fn exit_teacher_visit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<VisitRecord>> {
    let record = state.services.visits.mark_exit(VisitorKind::Teacher, id).await?;
    Ok(Json(record))
}

/// Find today's open visit for a roll number
#[utoipa::path(
    get,
    path = "/visits/active/{roll_no}",
    tag = "visits",
    params(("roll_no" = String, Path, description = "Student roll number")),
    responses(
        (status = 200, description = "Lookup result", body = ActiveVisitLookup)
    )
)]
pub async fn check_active_student(
    State(state): State<AppState>,
    Path(roll_no): Path<String>,
) -> AppResult<Json<ActiveVisitLookup>> {
    let lookup = state.services.visits.check_active_student(&roll_no).await?;
    Ok(Json(lookup))
}

/// Apply an action to selected student visits
#[utoipa::path(
    post,
    path = "/visits/students/bulk",
    tag = "visits",
    request_body = BulkActionRequest,
    responses(
        (status = 200, description = "Action applied", body = BulkActionResult),
        (status = 400, description = "Empty selection", body = crate::error::ErrorResponse)
    )
)]
pub async fn bulk_student_action(
    State(state): State<AppState>,
    Json(request): Json<BulkActionRequest>,
) -> AppResult<Json<BulkActionResult>> {
    let result = state
        .services
        .visits
        .bulk_action(VisitorKind::Student, &request)
        .await?;
    Ok(Json(result))
}

/// Apply an action to selected teacher visits
#[utoipa::path(
    post,
    path = "/visits/teachers/bulk",
    tag = "visits",
    request_body = BulkActionRequest,
    responses(
        (status = 200, description = "Action applied", body = BulkActionResult),
        (status = 400, description = "Empty selection", body = crate::error::ErrorResponse)
    )
)]
pub async fn bulk_teacher_action(
    State(state): State<AppState>,
    Json(request): Json<BulkActionRequest>,
) -> AppResult<Json<BulkActionResult>> {
    let result = state
        .services
        .visits
        .bulk_action(VisitorKind::Teacher, &request)
        .await?;
    Ok(Json(result))
}
