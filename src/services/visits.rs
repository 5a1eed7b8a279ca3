//! Visit lifecycle: entries, exits, bulk administration and listing

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Timelike};

use super::{clock::DateProvider, record_query};
use crate::{
    analytics::{resolve, RangeRequest},
    error::{AppError, AppResult},
    models::{
        visit::{
            parse_time_of_day, ActiveVisitLookup, BulkActionRequest, BulkActionResult,
            CreateStudentVisit, CreateTeacherVisit, VisitPage, VisitQuery, JC_COURSE_PLACEHOLDER,
        },
        BulkActionKind, Level, NewVisit, VisitRecord, VisitorDetails, VisitorKind,
    },
    repository::{page_offset, VisitStore},
};

pub const DEFAULT_PER_PAGE: i64 = 50;
pub const MAX_PER_PAGE: i64 = 500;

/// Trimmed value of a required text field
fn required(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Trimmed value of an optional text field, blanks dropped
fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn normalize_roll_no(roll_no: &str) -> AppResult<String> {
    Ok(required("roll_no", roll_no)?.to_uppercase())
}

#[derive(Clone)]
pub struct VisitsService {
    store: Arc<dyn VisitStore>,
    clock: Arc<dyn DateProvider>,
}

impl VisitsService {
    pub fn new(store: Arc<dyn VisitStore>, clock: Arc<dyn DateProvider>) -> Self {
        Self { store, clock }
    }

    fn current_time(&self) -> NaiveTime {
        let time = self.clock.now().time();
        time.with_nanosecond(0).unwrap_or(time)
    }

    /// Resolve date, entry and exit of a new visit, defaulting to now
    fn visit_times(
        &self,
        visit_date: &Option<String>,
        entry_time: &Option<String>,
        exit_time: &Option<String>,
    ) -> AppResult<(NaiveDate, NaiveTime, Option<NaiveTime>)> {
        let date = match optional(visit_date) {
            Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| AppError::Validation(format!("Invalid visit_date '{}', expected YYYY-MM-DD", raw)))?,
            None => self.clock.today(),
        };
        let entry = match optional(entry_time) {
            Some(raw) => parse_time_of_day(&raw)
                .ok_or_else(|| AppError::Validation(format!("Invalid entry_time '{}', expected HH:MM", raw)))?,
            None => self.current_time(),
        };
        let exit = match optional(exit_time) {
            Some(raw) => Some(
                parse_time_of_day(&raw)
                    .ok_or_else(|| AppError::Validation(format!("Invalid exit_time '{}', expected HH:MM", raw)))?,
            ),
            None => None,
        };

        if let Some(exit) = exit {
            if exit <= entry {
                return Err(AppError::Validation(
                    "Exit time must be after entry time".to_string(),
                ));
            }
        }
        Ok((date, entry, exit))
    }

    pub async fn record_student_entry(&self, data: &CreateStudentVisit) -> AppResult<VisitRecord> {
        let name = required("name", &data.name)?;
        let roll_no = normalize_roll_no(&data.roll_no)?;
        let purpose = required("purpose", &data.purpose)?;

        let details = match data.level {
            Level::Jc => {
                let (jc_year, jc_stream) = match (optional(&data.jc_year), optional(&data.jc_stream)) {
                    (Some(year), Some(stream)) => (year, stream),
                    _ => {
                        return Err(AppError::Validation(
                            "JC Year and Stream are required for JC students".to_string(),
                        ))
                    }
                };
                VisitorDetails::Student {
                    roll_no,
                    level: Level::Jc.as_code().to_string(),
                    course: Some(optional(&data.course).unwrap_or_else(|| JC_COURSE_PLACEHOLDER.to_string())),
                    year: None,
                    jc_year: Some(jc_year),
                    jc_stream: Some(jc_stream),
                }
            }
            level => {
                let course = optional(&data.course).ok_or_else(|| {
                    AppError::Validation("Course is required for UG/PG students".to_string())
                })?;
                VisitorDetails::Student {
                    roll_no,
                    level: level.as_code().to_string(),
                    course: Some(course),
                    year: optional(&data.year),
                    jc_year: None,
                    jc_stream: None,
                }
            }
        };

        let (visit_date, entry_time, exit_time) =
            self.visit_times(&data.visit_date, &data.entry_time, &data.exit_time)?;

        let visit = NewVisit {
            name,
            purpose,
            visit_date,
            visit_day: visit_date.format("%A").to_string(),
            entry_time,
            exit_time,
            details,
        };
        let record = self.store.insert(&visit).await?;
        tracing::info!("Recorded student visit {} ({})", record.id, record.name);
        Ok(record)
    }

    pub async fn record_teacher_entry(&self, data: &CreateTeacherVisit) -> AppResult<VisitRecord> {
        let name = required("name", &data.name)?;
        let purpose = required("purpose", &data.purpose)?;
        let (visit_date, entry_time, exit_time) =
            self.visit_times(&data.visit_date, &data.entry_time, &data.exit_time)?;

        let visit = NewVisit {
            name,
            purpose,
            visit_date,
            visit_day: visit_date.format("%A").to_string(),
            entry_time,
            exit_time,
            details: VisitorDetails::Teacher {
                employee_id: optional(&data.employee_id),
                notes: optional(&data.notes),
            },
        };
        let record = self.store.insert(&visit).await?;
        tracing::info!("Recorded teacher visit {} ({})", record.id, record.name);
        Ok(record)
    }

    /// Close an active visit at the current time
    pub async fn mark_exit(&self, kind: VisitorKind, id: i32) -> AppResult<VisitRecord> {
        let record = self.store.mark_exit(kind, id, self.current_time()).await?;
        tracing::info!("Marked exit for {} visit {}", kind, id);
        Ok(record)
    }

    /// Today's open visit for a roll number, as used by the exit desk
    pub async fn check_active_student(&self, roll_no: &str) -> AppResult<ActiveVisitLookup> {
        let roll_no = normalize_roll_no(roll_no)?;

        if let Some(visitor) = self
            .store
            .find_active_student_visit(&roll_no, self.clock.today())
            .await?
        {
            return Ok(ActiveVisitLookup {
                visitor: Some(visitor),
                message: None,
            });
        }

        let message = match self.store.latest_student_visit(&roll_no).await? {
            Some(_) => "Visitor found but already exited",
            None => "No visitor found with this roll number",
        };
        Ok(ActiveVisitLookup {
            visitor: None,
            message: Some(message.to_string()),
        })
    }

    pub async fn bulk_action(&self, kind: VisitorKind, request: &BulkActionRequest) -> AppResult<BulkActionResult> {
        if request.visitor_ids.is_empty() {
            return Err(AppError::Validation("No visitors selected".to_string()));
        }

        let succeeded = match request.action {
            BulkActionKind::MarkExit => {
                let exit_time = self.current_time();
                let mut succeeded = 0;
                for &id in &request.visitor_ids {
                    match self.store.mark_exit(kind, id, exit_time).await {
                        Ok(_) => succeeded += 1,
                        Err(AppError::Conflict(_)) | Err(AppError::NotFound(_)) => {
                            tracing::debug!("Skipping {} visit {} in bulk exit", kind, id);
                        }
                        Err(e) => return Err(e),
                    }
                }
                succeeded
            }
            BulkActionKind::Delete => self.store.delete_many(kind, &request.visitor_ids).await? as usize,
        };

        tracing::info!(
            "Bulk {:?} on {} visits: {}/{} applied",
            request.action,
            kind,
            succeeded,
            request.visitor_ids.len()
        );
        Ok(BulkActionResult {
            action: request.action,
            requested: request.visitor_ids.len(),
            succeeded,
        })
    }

    /// Paginated listing, newest first. Without any range parameter the listing covers all history.
    pub async fn list(&self, kind: VisitorKind, query: &VisitQuery) -> AppResult<VisitPage> {
        let request: RangeRequest = query.range_request();
        let range = if request == RangeRequest::default() {
            None
        } else {
            Some(resolve(&request, self.clock.today())?)
        };
        let store_query = record_query(kind, range, &query.filters())?;

        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        page_offset(page, per_page)?;

        let (visits, total) = self.store.fetch_page(kind, &store_query, page, per_page).await?;
        Ok(VisitPage {
            visits,
            total,
            page,
            per_page,
        })
    }
}
