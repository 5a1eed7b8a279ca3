//! Visits repository (Postgres)

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{postgres::PgArguments, query::QueryAs, Pool, Postgres};

use super::{page_offset, VisitStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        visit::{StudentVisitRow, TeacherVisitRow},
        NewVisit, RecordQuery, VisitRecord, VisitStatus, VisitorDetails, VisitorKind,
    },
};

const STUDENT_COLUMNS: &str = "id, name, roll_no, level, course, year, jc_year, jc_stream, purpose, \
     visit_date, visit_day, entry_time, exit_time";

const TEACHER_COLUMNS: &str =
    "id, name, employee_id, purpose, notes, visit_date, visit_day, entry_time, exit_time";

fn columns(kind: VisitorKind) -> &'static str {
    match kind {
        VisitorKind::Student => STUDENT_COLUMNS,
        VisitorKind::Teacher => TEACHER_COLUMNS,
    }
}

/// Build the WHERE clause for a record query; placeholders are numbered from $1
fn where_clause(query: &RecordQuery) -> String {
    let mut conditions = Vec::new();
    let mut idx = 1;

    if query.range.is_some() {
        conditions.push(format!("visit_date >= ${}", idx));
        conditions.push(format!("visit_date <= ${}", idx + 1));
        idx += 2;
    }
    if query.level.is_some() {
        conditions.push(format!("UPPER(TRIM(level)) = ${}", idx));
    }
    match query.status {
        Some(VisitStatus::Active) => conditions.push("exit_time IS NULL".to_string()),
        Some(VisitStatus::Exited) => conditions.push("exit_time IS NOT NULL".to_string()),
        None => {}
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

/// Bind parameters in the order `where_clause` numbered them
fn bind_filters<'q, O>(
    mut builder: QueryAs<'q, Postgres, O, PgArguments>,
    query: &'q RecordQuery,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    if let Some(range) = query.range {
        builder = builder.bind(range.start).bind(range.end);
    }
    if let Some(level) = &query.level {
        builder = builder.bind(level.as_str());
    }
    builder
}

#[derive(Clone)]
pub struct VisitsRepository {
    pool: Pool<Postgres>,
}

impl VisitsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn fetch_with(
        &self,
        kind: VisitorKind,
        sql: &str,
        query: &RecordQuery,
    ) -> AppResult<Vec<VisitRecord>> {
        let records = match kind {
            VisitorKind::Student => bind_filters(sqlx::query_as::<_, StudentVisitRow>(sql), query)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(VisitRecord::from)
                .collect(),
            VisitorKind::Teacher => bind_filters(sqlx::query_as::<_, TeacherVisitRow>(sql), query)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(VisitRecord::from)
                .collect(),
        };
        Ok(records)
    }

    fn check_query(kind: VisitorKind, query: &RecordQuery) -> AppResult<()> {
        if kind == VisitorKind::Teacher && query.level.is_some() {
            return Err(AppError::Validation(
                "Level filter only applies to student visits".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VisitStore for VisitsRepository {
    async fn fetch_records(&self, kind: VisitorKind, query: &RecordQuery) -> AppResult<Vec<VisitRecord>> {
        Self::check_query(kind, query)?;

        let sql = format!(
            "SELECT {} FROM {} {} ORDER BY visit_date DESC, id DESC",
            columns(kind),
            kind.table(),
            where_clause(query)
        );
        self.fetch_with(kind, &sql, query).await
    }

    async fn fetch_page(
        &self,
        kind: VisitorKind,
        query: &RecordQuery,
        page: i64,
        per_page: i64,
    ) -> AppResult<(Vec<VisitRecord>, i64)> {
        Self::check_query(kind, query)?;

        let offset = page_offset(page, per_page)?;
        let where_sql = where_clause(query);

        let count_q = format!("SELECT COUNT(*) FROM {} {}", kind.table(), where_sql);
        let (total,): (i64,) = bind_filters(sqlx::query_as::<_, (i64,)>(&count_q), query)
            .fetch_one(&self.pool)
            .await?;

        let select_q = format!(
            "SELECT {} FROM {} {} ORDER BY visit_date DESC, id DESC LIMIT {} OFFSET {}",
            columns(kind),
            kind.table(),
            where_sql,
            per_page,
            offset
        );
        let visits = self.fetch_with(kind, &select_q, query).await?;
        Ok((visits, total))
    }

    async fn insert(&self, visit: &NewVisit) -> AppResult<VisitRecord> {
        let record = match &visit.details {
            VisitorDetails::Student {
                roll_no,
                level,
                course,
                year,
                jc_year,
                jc_stream,
            } => {
                let sql = format!(
                    r#"
                    INSERT INTO visitors (name, roll_no, level, course, year, jc_year, jc_stream,
                                          purpose, visit_date, visit_day, entry_time, exit_time)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                    RETURNING {}
                    "#,
                    STUDENT_COLUMNS
                );
                sqlx::query_as::<_, StudentVisitRow>(&sql)
                    .bind(&visit.name)
                    .bind(roll_no)
                    .bind(level)
                    .bind(course)
                    .bind(year)
                    .bind(jc_year)
                    .bind(jc_stream)
                    .bind(&visit.purpose)
                    .bind(visit.visit_date)
                    .bind(&visit.visit_day)
                    .bind(visit.entry_time)
                    .bind(visit.exit_time)
                    .fetch_one(&self.pool)
                    .await?
                    .into()
            }
            VisitorDetails::Teacher { employee_id, notes } => {
                let sql = format!(
                    r#"
                    INSERT INTO teacher_visits (name, employee_id, purpose, notes,
                                                visit_date, visit_day, entry_time, exit_time)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING {}
                    "#,
                    TEACHER_COLUMNS
                );
                sqlx::query_as::<_, TeacherVisitRow>(&sql)
                    .bind(&visit.name)
                    .bind(employee_id)
                    .bind(&visit.purpose)
                    .bind(notes)
                    .bind(visit.visit_date)
                    .bind(&visit.visit_day)
                    .bind(visit.entry_time)
                    .bind(visit.exit_time)
                    .fetch_one(&self.pool)
                    .await?
                    .into()
            }
        };
        Ok(record)
    }

    async fn mark_exit(&self, kind: VisitorKind, id: i32, exit_time: NaiveTime) -> AppResult<VisitRecord> {
        // The IS NULL guard makes the transition happen at most once.
        let sql = format!(
            "UPDATE {} SET exit_time = $2 WHERE id = $1 AND exit_time IS NULL RETURNING {}",
            kind.table(),
            columns(kind)
        );
        let updated: Option<VisitRecord> = match kind {
            VisitorKind::Student => sqlx::query_as::<_, StudentVisitRow>(&sql)
                .bind(id)
                .bind(exit_time)
                .fetch_optional(&self.pool)
                .await?
                .map(Into::into),
            VisitorKind::Teacher => sqlx::query_as::<_, TeacherVisitRow>(&sql)
                .bind(id)
                .bind(exit_time)
                .fetch_optional(&self.pool)
                .await?
                .map(Into::into),
        };

        if let Some(record) = updated {
            return Ok(record);
        }

        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            kind.table()
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Err(AppError::Conflict(format!("Visit {} has already exited", id)))
        } else {
            Err(AppError::NotFound(format!("Visit with id {} not found", id)))
        }
    }

    async fn delete_many(&self, kind: VisitorKind, ids: &[i32]) -> AppResult<u64> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ANY($1)", kind.table()))
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_active_student_visit(&self, roll_no: &str, date: NaiveDate) -> AppResult<Option<VisitRecord>> {
        let sql = format!(
            "SELECT {} FROM visitors WHERE roll_no = $1 AND visit_date = $2 AND exit_time IS NULL \
             ORDER BY id DESC LIMIT 1",
            STUDENT_COLUMNS
        );
        let row = sqlx::query_as::<_, StudentVisitRow>(&sql)
            .bind(roll_no)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn latest_student_visit(&self, roll_no: &str) -> AppResult<Option<VisitRecord>> {
        let sql = format!(
            "SELECT {} FROM visitors WHERE roll_no = $1 ORDER BY id DESC LIMIT 1",
            STUDENT_COLUMNS
        );
        let row = sqlx::query_as::<_, StudentVisitRow>(&sql)
            .bind(roll_no)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::DateRange;

    #[test]
    fn test_where_clause_numbering() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let query = RecordQuery {
            range: Some(DateRange::single(day)),
            level: Some("UG".to_string()),
            status: Some(VisitStatus::Active),
        };
        assert_eq!(
            where_clause(&query),
            "WHERE visit_date >= $1 AND visit_date <= $2 AND UPPER(TRIM(level)) = $3 AND exit_time IS NULL"
        );
    }

    #[test]
    fn test_where_clause_level_only() {
        let query = RecordQuery {
            level: Some("JC".to_string()),
            status: Some(VisitStatus::Exited),
            ..RecordQuery::default()
        };
        assert_eq!(where_clause(&query), "WHERE UPPER(TRIM(level)) = $1 AND exit_time IS NOT NULL");
        assert_eq!(where_clause(&RecordQuery::default()), "");
    }

    #[test]
    fn test_teacher_level_filter_is_rejected() {
        let query = RecordQuery {
            level: Some("UG".to_string()),
            ..RecordQuery::default()
        };
        assert!(VisitsRepository::check_query(VisitorKind::Teacher, &query).is_err());
        assert!(VisitsRepository::check_query(VisitorKind::Student, &query).is_ok());
    }
}
