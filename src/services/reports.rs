//! Report assembly: range resolution, record fetch and aggregation

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Datelike;
use serde::Serialize;
use utoipa::ToSchema;

use super::{clock::DateProvider, record_query};
use crate::{
    analytics::{resolve, AggregateOptions, AggregateResult, Aggregator, DateRange, RangeRequest},
    error::AppResult,
    models::{RecordQuery, ReportFilters, VisitRecord, VisitorKind},
    repository::VisitStore,
};

/// Dashboard payload: aggregates plus the records they were computed from
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub kind: VisitorKind,
    /// Resolved interval; absent for lifetime reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
    #[serde(flatten)]
    pub aggregate: AggregateResult,
    pub visitors: Vec<VisitRecord>,
}

/// Headline figures of the teacher dashboard
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSummary {
    pub total_visits: i64,
    /// Distinct teacher names over all history
    pub unique_teachers: i64,
    pub today_visits: i64,
    /// Today's visits without an exit time
    pub active_now: i64,
    /// Mean duration of today's finished visits, in minutes
    pub avg_duration_today: f64,
    /// Visits in the current calendar month
    pub this_month: i64,
}

#[derive(Clone)]
pub struct ReportsService {
    store: Arc<dyn VisitStore>,
    clock: Arc<dyn DateProvider>,
}

impl ReportsService {
    pub fn new(store: Arc<dyn VisitStore>, clock: Arc<dyn DateProvider>) -> Self {
        Self { store, clock }
    }

    /// Report over a resolved date range
    pub async fn build_report(
        &self,
        kind: VisitorKind,
        request: &RangeRequest,
        filters: &ReportFilters,
    ) -> AppResult<Report> {
        let range = resolve(request, self.clock.today())?;
        let query = record_query(kind, Some(range), filters)?;

        let records = self.store.fetch_records(kind, &query).await?;
        tracing::debug!(
            "Building {} report for {}..{} over {} records",
            kind,
            range.start,
            range.end,
            records.len()
        );

        let aggregator = Aggregator::new(AggregateOptions::for_kind(kind).with_range(range));
        Ok(Report {
            kind,
            range: Some(range),
            aggregate: aggregator.aggregate(&records),
            visitors: records,
        })
    }

    /// Report over all history, with days of operation and daily average
    pub async fn lifetime_report(&self, kind: VisitorKind, filters: &ReportFilters) -> AppResult<Report> {
        let query = record_query(kind, None, filters)?;

        let records = self.store.fetch_records(kind, &query).await?;
        tracing::debug!("Building lifetime {} report over {} records", kind, records.len());

        let aggregator = Aggregator::new(AggregateOptions::for_kind(kind).with_lifetime());
        Ok(Report {
            kind,
            range: None,
            aggregate: aggregator.aggregate(&records),
            visitors: records,
        })
    }

    pub async fn teacher_summary(&self) -> AppResult<TeacherSummary> {
        let all = self
            .store
            .fetch_records(VisitorKind::Teacher, &RecordQuery::default())
            .await?;
        let today = self.clock.today();

        let unique_teachers = all
            .iter()
            .map(|visit| visit.name.as_str())
            .collect::<HashSet<_>>()
            .len() as i64;

        let today_visits: Vec<VisitRecord> = all
            .iter()
            .filter(|visit| visit.visit_date == today)
            .cloned()
            .collect();
        let today_stats = Aggregator::new(AggregateOptions {
            breakdowns: Vec::new(),
            range: Some(DateRange::single(today)),
            lifetime: false,
        })
        .aggregate(&today_visits)
        .stats;

        let this_month = all
            .iter()
            .filter(|visit| {
                visit.visit_date.year() == today.year() && visit.visit_date.month() == today.month()
            })
            .count() as i64;

        Ok(TeacherSummary {
            total_visits: all.len() as i64,
            unique_teachers,
            today_visits: today_stats.total,
            active_now: today_stats.active,
            avg_duration_today: today_stats.avg_duration,
            this_month,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::RangeShortcut;
    use crate::error::AppError;
    use crate::models::{VisitStatus, VisitorDetails};
    use crate::repository::MockVisitStore;
    use crate::services::clock::FixedDateProvider;
    use chrono::{NaiveDate, NaiveTime};
    use tokio_test::{assert_err, assert_ok};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock() -> Arc<dyn DateProvider> {
        Arc::new(FixedDateProvider::new(date(2024, 3, 10).and_hms_opt(15, 0, 0).unwrap()))
    }

    fn visit(id: i32, day: NaiveDate, entry: (u32, u32), exit: Option<(u32, u32)>, level: &str) -> VisitRecord {
        VisitRecord {
            id,
            name: format!("Student {}", id),
            visit_date: day,
            visit_day: day.format("%A").to_string(),
            entry_time: NaiveTime::from_hms_opt(entry.0, entry.1, 0).unwrap(),
            exit_time: exit.map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap()),
            purpose: "Reading".to_string(),
            details: VisitorDetails::Student {
                roll_no: format!("R{}", id),
                level: level.to_string(),
                course: Some("BSc".to_string()),
                year: None,
                jc_year: None,
                jc_stream: None,
            },
        }
    }

    fn teacher(id: i32, name: &str, day: NaiveDate, entry: (u32, u32), exit: Option<(u32, u32)>) -> VisitRecord {
        VisitRecord {
            id,
            name: name.to_string(),
            visit_date: day,
            visit_day: day.format("%A").to_string(),
            entry_time: NaiveTime::from_hms_opt(entry.0, entry.1, 0).unwrap(),
            exit_time: exit.map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap()),
            purpose: "Research".to_string(),
            details: VisitorDetails::Teacher {
                employee_id: None,
                notes: None,
            },
        }
    }

    #[tokio::test]
    async fn test_week_report_queries_resolved_range() {
        let mut store = MockVisitStore::new();
        store
            .expect_fetch_records()
            .withf(|kind, query| {
                *kind == VisitorKind::Student
                    && query.range == Some(DateRange::new(date(2024, 3, 3), date(2024, 3, 10)).unwrap())
                    && query.level.as_deref() == Some("UG")
                    && query.status.is_none()
            })
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    visit(1, date(2024, 3, 4), (9, 0), Some((9, 20)), "UG"),
                    visit(2, date(2024, 3, 9), (10, 0), Some((11, 30)), "UG"),
                ])
            });

        let service = ReportsService::new(Arc::new(store), clock());
        let filters = ReportFilters {
            level: Some("ug".to_string()),
            status: None,
        };
        let report = assert_ok!(
            service
                .build_report(VisitorKind::Student, &RangeRequest::shortcut(RangeShortcut::Week), &filters)
                .await
        );

        assert_eq!(report.aggregate.stats.total, 2);
        assert_eq!(report.aggregate.stats.avg_duration, 55.0);
        assert_eq!(report.aggregate.daily_trend.labels.len(), 8);
        assert_eq!(report.visitors.len(), 2);
        assert!(report.aggregate.course_data.is_some());
        assert!(report.aggregate.purpose_data.is_some());
    }

    #[tokio::test]
    async fn test_inverted_range_never_reaches_store() {
        let mut store = MockVisitStore::new();
        store.expect_fetch_records().never();

        let service = ReportsService::new(Arc::new(store), clock());
        let request = RangeRequest::explicit("2024-03-10", "2024-03-05");
        let err = assert_err!(
            service
                .build_report(VisitorKind::Student, &request, &ReportFilters::default())
                .await
        );
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_teacher_level_filter_is_rejected() {
        let mut store = MockVisitStore::new();
        store.expect_fetch_records().never();

        let service = ReportsService::new(Arc::new(store), clock());
        let filters = ReportFilters {
            level: Some("UG".to_string()),
            status: None,
        };
        let err = assert_err!(service.lifetime_report(VisitorKind::Teacher, &filters).await);
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_range_gives_zero_report() {
        let mut store = MockVisitStore::new();
        store.expect_fetch_records().returning(|_, _| Ok(Vec::new()));

        let service = ReportsService::new(Arc::new(store), clock());
        let report = assert_ok!(
            service
                .build_report(
                    VisitorKind::Teacher,
                    &RangeRequest::shortcut(RangeShortcut::Today),
                    &ReportFilters::default()
                )
                .await
        );

        assert_eq!(report.aggregate.stats.total, 0);
        assert_eq!(report.aggregate.stats.active, 0);
        assert_eq!(report.aggregate.stats.avg_duration, 0.0);
        assert_eq!(report.aggregate.peak_hours.total(), 0);
        assert!(report.aggregate.course_data.is_none());
        assert!(report.visitors.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockVisitStore::new();
        store
            .expect_fetch_records()
            .returning(|_, _| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let service = ReportsService::new(Arc::new(store), clock());
        let err = assert_err!(
            service
                .build_report(VisitorKind::Student, &RangeRequest::default(), &ReportFilters::default())
                .await
        );
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_lifetime_report_has_lifetime_stats() {
        let mut store = MockVisitStore::new();
        store
            .expect_fetch_records()
            .withf(|_, query| query.range.is_none() && query.status == Some(VisitStatus::Exited))
            .returning(|_, _| {
                Ok(vec![
                    visit(1, date(2024, 1, 2), (9, 0), Some((10, 0)), "PG"),
                    visit(2, date(2024, 1, 2), (11, 0), Some((12, 0)), "PG"),
                    visit(3, date(2024, 2, 1), (14, 0), Some((14, 45)), "JC"),
                ])
            });

        let service = ReportsService::new(Arc::new(store), clock());
        let filters = ReportFilters {
            level: None,
            status: Some(VisitStatus::Exited),
        };
        let report = assert_ok!(service.lifetime_report(VisitorKind::Student, &filters).await);

        assert!(report.range.is_none());
        let lifetime = report.aggregate.lifetime.expect("lifetime stats");
        assert_eq!(lifetime.days_of_operation, 2);
        assert_eq!(lifetime.avg_daily, 1.5);
    }

    #[tokio::test]
    async fn test_teacher_summary() {
        let mut store = MockVisitStore::new();
        store
            .expect_fetch_records()
            .withf(|kind, query| *kind == VisitorKind::Teacher && *query == RecordQuery::default())
            .returning(|_, _| {
                Ok(vec![
                    teacher(1, "Rao", date(2024, 3, 10), (9, 0), Some((10, 0))),
                    teacher(2, "Iyer", date(2024, 3, 10), (11, 0), None),
                    teacher(3, "Rao", date(2024, 3, 2), (9, 0), Some((9, 30))),
                    teacher(4, "Khan", date(2024, 2, 28), (9, 0), Some((9, 30))),
                ])
            });

        let service = ReportsService::new(Arc::new(store), clock());
        let summary = assert_ok!(service.teacher_summary().await);

        assert_eq!(
            summary,
            TeacherSummary {
                total_visits: 4,
                unique_teachers: 3,
                today_visits: 2,
                active_now: 1,
                avg_duration_today: 60.0,
                this_month: 3,
            }
        );
    }
}
