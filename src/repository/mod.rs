//! Repository layer for database operations

pub mod visits;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{NewVisit, RecordQuery, VisitRecord, VisitorKind},
};

/// Access to the persisted visit logs.
///
/// `mark_exit` must be atomic: the exit time is written only when it is
/// still absent, and a second exit on the same visit fails with
/// `AppError::Conflict` instead of overwriting it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// All visits of `kind` matching `query`, newest first
    async fn fetch_records(&self, kind: VisitorKind, query: &RecordQuery) -> AppResult<Vec<VisitRecord>>;

    /// One page of matching visits, with the total match count
    async fn fetch_page(
        &self,
        kind: VisitorKind,
        query: &RecordQuery,
        page: i64,
        per_page: i64,
    ) -> AppResult<(Vec<VisitRecord>, i64)>;

    /// Store a new visit; the kind follows `visit.details`
    async fn insert(&self, visit: &NewVisit) -> AppResult<VisitRecord>;

    async fn mark_exit(&self, kind: VisitorKind, id: i32, exit_time: NaiveTime) -> AppResult<VisitRecord>;

    /// Delete the listed visits, returning how many existed
    async fn delete_many(&self, kind: VisitorKind, ids: &[i32]) -> AppResult<u64>;

    /// The open visit of a student on `date`, if any
    async fn find_active_student_visit(&self, roll_no: &str, date: NaiveDate) -> AppResult<Option<VisitRecord>>;

    /// The most recent visit of a student, open or not
    async fn latest_student_visit(&self, roll_no: &str) -> AppResult<Option<VisitRecord>>;
}

/// Row offset of a 1-based page, rejecting pages past the addressable range
pub fn page_offset(page: i64, per_page: i64) -> AppResult<i64> {
    page
        .checked_sub(1)
        .filter(|p| *p >= 0)
        .and_then(|p| p.checked_mul(per_page))
        .ok_or_else(|| AppError::Validation(format!("Page {} is out of range", page)))
}

/// Repositories built over one database pool
#[derive(Clone)]
pub struct Repository {
    pub visits: visits::VisitsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            visits: visits::VisitsRepository::new(pool),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 50).unwrap(), 0);
        assert_eq!(page_offset(3, 20).unwrap(), 40);
    }

    #[test]
    fn test_page_offset_rejects_overflow() {
        assert!(matches!(page_offset(i64::MAX, 500), Err(AppError::Validation(_))));
        assert!(matches!(page_offset(0, 50), Err(AppError::Validation(_))));
        assert!(matches!(page_offset(i64::MIN, 50), Err(AppError::Validation(_))));
    }
}
