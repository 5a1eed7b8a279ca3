//! Business logic services

pub mod clock;
pub mod reports;
pub mod visits;

use std::sync::Arc;

use crate::{
    analytics::DateRange,
    error::{AppError, AppResult},
    models::{Level, RecordQuery, ReportFilters, VisitorKind},
    repository::VisitStore,
};

use clock::DateProvider;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub reports: reports::ReportsService,
    pub visits: visits::VisitsService,
}

impl Services {
    /// Create all services over the given store and clock
    pub fn new(store: Arc<dyn VisitStore>, clock: Arc<dyn DateProvider>) -> Self {
        Self {
            reports: reports::ReportsService::new(store.clone(), clock.clone()),
            visits: visits::VisitsService::new(store, clock),
        }
    }
}

/// Build the store query for a kind, validating the level filter
pub(crate) fn record_query(
    kind: VisitorKind,
    range: Option<DateRange>,
    filters: &ReportFilters,
) -> AppResult<RecordQuery> {
    let level = match filters.level.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(_) if kind == VisitorKind::Teacher => {
            return Err(AppError::Validation(
                "Level filter only applies to student visits".to_string(),
            ))
        }
        Some(raw) => {
            let level = Level::from_code(raw).ok_or_else(|| {
                AppError::Validation(format!("Unknown level '{}', expected JC, UG or PG", raw))
            })?;
            Some(level.as_code().to_string())
        }
    };

    Ok(RecordQuery {
        range,
        level,
        status: filters.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitStatus;

    #[test]
    fn test_record_query_normalizes_level() {
        let filters = ReportFilters {
            level: Some(" pg ".to_string()),
            status: Some(VisitStatus::Active),
        };
        let query = record_query(VisitorKind::Student, None, &filters).unwrap();
        assert_eq!(query.level.as_deref(), Some("PG"));
        assert_eq!(query.status, Some(VisitStatus::Active));
    }

    #[test]
    fn test_record_query_rejects_bad_levels() {
        let unknown = ReportFilters {
            level: Some("PhD".to_string()),
            status: None,
        };
        assert!(record_query(VisitorKind::Student, None, &unknown).is_err());

        let teacher = ReportFilters {
            level: Some("UG".to_string()),
            status: None,
        };
        assert!(record_query(VisitorKind::Teacher, None, &teacher).is_err());

        let blank = ReportFilters {
            level: Some("".to_string()),
            status: None,
        };
        assert!(record_query(VisitorKind::Teacher, None, &blank).unwrap().level.is_none());
    }
}
