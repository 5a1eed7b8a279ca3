//! Visit record model (student and teacher visit logs)

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::{BulkActionKind, Level, VisitStatus};
use crate::analytics::{duration_minutes, DateRange, RangeRequest, RangeShortcut};

/// Course label stored for junior college students, who are tracked by stream instead
pub const JC_COURSE_PLACEHOLDER: &str = "Junior College";

/// Parse a time of day written as `HH:MM` or `HH:MM:SS`
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Serde adapter writing times of day as `HH:MM`
pub mod time_hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid time of day: {}", raw)))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => serializer.collect_str(&t.format("%H:%M")),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => crate::models::visit::parse_time_of_day(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid time of day: {}", raw))),
            }
        }
    }
}

/// A single visit: one entry event, and at most one exit event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VisitRecord {
    pub id: i32,
    pub name: String,
    /// Day the visit began
    pub visit_date: NaiveDate,
    /// Weekday name captured at creation time
    pub visit_day: String,
    #[serde(with = "time_hhmm")]
    #[schema(value_type = String, example = "09:30")]
    pub entry_time: NaiveTime,
    /// Absent while the visitor is still on site
    #[serde(with = "time_hhmm::option", default)]
    #[schema(value_type = Option<String>, example = "11:00")]
    pub exit_time: Option<NaiveTime>,
    pub purpose: String,
    #[serde(flatten)]
    pub details: VisitorDetails,
}

/// Kind-specific attributes of a visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisitorDetails {
    Student {
        roll_no: String,
        /// Stored level code; JC, UG or PG for well-formed rows
        level: String,
        course: Option<String>,
        year: Option<String>,
        jc_year: Option<String>,
        jc_stream: Option<String>,
    },
    Teacher {
        employee_id: Option<String>,
        notes: Option<String>,
    },
}

impl VisitRecord {
    /// A visit is active until its exit time is recorded
    pub fn is_active(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Elapsed whole minutes, `None` while the visit is still active
    pub fn duration_minutes(&self) -> Option<i64> {
        duration_minutes(self.entry_time, self.exit_time)
    }

    /// Raw stored level, students only
    pub fn level(&self) -> Option<&str> {
        match &self.details {
            VisitorDetails::Student { level, .. } => Some(level.as_str()),
            VisitorDetails::Teacher { .. } => None,
        }
    }

    /// Course grouping key: the stream for junior college students, the course otherwise
    pub fn course_key(&self) -> Option<&str> {
        match &self.details {
            VisitorDetails::Student {
                level,
                course,
                jc_stream,
                ..
            } => {
                if Level::from_code(level) == Some(Level::Jc) {
                    jc_stream.as_deref()
                } else {
                    course.as_deref()
                }
            }
            VisitorDetails::Teacher { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Database rows
// ---------------------------------------------------------------------------

/// Row of the `visitors` table
#[derive(Debug, Clone, FromRow)]
pub struct StudentVisitRow {
    pub id: i32,
    pub name: String,
    pub roll_no: String,
    pub level: Option<String>,
    pub course: Option<String>,
    pub year: Option<String>,
    pub jc_year: Option<String>,
    pub jc_stream: Option<String>,
    pub purpose: Option<String>,
    pub visit_date: NaiveDate,
    pub visit_day: Option<String>,
    pub entry_time: NaiveTime,
    pub exit_time: Option<NaiveTime>,
}

impl From<StudentVisitRow> for VisitRecord {
    fn from(row: StudentVisitRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            visit_date: row.visit_date,
            visit_day: row.visit_day.unwrap_or_default(),
            entry_time: row.entry_time,
            exit_time: row.exit_time,
            purpose: row.purpose.unwrap_or_default(),
            details: VisitorDetails::Student {
                roll_no: row.roll_no,
                level: row.level.unwrap_or_default(),
                course: row.course,
                year: row.year,
                jc_year: row.jc_year,
                jc_stream: row.jc_stream,
            },
        }
    }
}

/// Row of the `teacher_visits` table
#[derive(Debug, Clone, FromRow)]
pub struct TeacherVisitRow {
    pub id: i32,
    pub name: String,
    pub employee_id: Option<String>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub visit_date: NaiveDate,
    pub visit_day: Option<String>,
    pub entry_time: NaiveTime,
    pub exit_time: Option<NaiveTime>,
}

impl From<TeacherVisitRow> for VisitRecord {
    fn from(row: TeacherVisitRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            visit_date: row.visit_date,
            visit_day: row.visit_day.unwrap_or_default(),
            entry_time: row.entry_time,
            exit_time: row.exit_time,
            purpose: row.purpose.unwrap_or_default(),
            details: VisitorDetails::Teacher {
                employee_id: row.employee_id,
                notes: row.notes,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Requests and queries
// ---------------------------------------------------------------------------

/// Record a student entry
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateStudentVisit {
    pub name: String,
    pub roll_no: String,
    pub level: Level,
    pub purpose: String,
    /// Required for UG/PG
    pub course: Option<String>,
    /// UG/PG year of study
    pub year: Option<String>,
    /// Required for JC
    pub jc_year: Option<String>,
    /// Required for JC
    pub jc_stream: Option<String>,
    /// Visit date (YYYY-MM-DD), defaults to today
    pub visit_date: Option<String>,
    /// Entry time (HH:MM), defaults to now
    pub entry_time: Option<String>,
    /// Exit time (HH:MM), for back-filled visits only
    pub exit_time: Option<String>,
}

/// Record a teacher entry
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTeacherVisit {
    pub name: String,
    pub purpose: String,
    pub employee_id: Option<String>,
    pub notes: Option<String>,
    /// Visit date (YYYY-MM-DD), defaults to today
    pub visit_date: Option<String>,
    /// Entry time (HH:MM), defaults to now
    pub entry_time: Option<String>,
    /// Exit time (HH:MM), for back-filled visits only
    pub exit_time: Option<String>,
}

/// Validated, normalized visit ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewVisit {
    pub name: String,
    pub purpose: String,
    pub visit_date: NaiveDate,
    pub visit_day: String,
    pub entry_time: NaiveTime,
    pub exit_time: Option<NaiveTime>,
    pub details: VisitorDetails,
}

/// Filters applied by the record store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    /// Inclusive date interval on `visit_date`; `None` means all history
    pub range: Option<DateRange>,
    /// Student level code
    pub level: Option<String>,
    pub status: Option<VisitStatus>,
}

impl RecordQuery {
    /// Whether a record passes this query's filters
    pub fn matches(&self, record: &VisitRecord) -> bool {
        if let Some(range) = &self.range {
            if !range.contains(record.visit_date) {
                return false;
            }
        }
        if let Some(level) = &self.level {
            // Stored codes may carry stray case or padding
            let stored = record.level().map(str::trim).unwrap_or_default();
            if !stored.eq_ignore_ascii_case(level.trim()) {
                return false;
            }
        }
        match self.status {
            Some(VisitStatus::Active) => record.is_active(),
            Some(VisitStatus::Exited) => !record.is_active(),
            None => true,
        }
    }
}

/// Query parameters shared by report and listing endpoints
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct VisitQuery {
    /// Named range: today, yesterday, week, month
    pub range: Option<RangeShortcut>,
    /// Start date (YYYY-MM-DD), defaults to today
    pub start_date: Option<String>,
    /// End date (YYYY-MM-DD), defaults to today
    pub end_date: Option<String>,
    /// Student level (JC, UG, PG)
    pub level: Option<String>,
    /// active or exited
    pub status: Option<VisitStatus>,
    /// Page number, listing only (default 1)
    pub page: Option<i64>,
    /// Page size, listing only (default 50, max 500)
    pub per_page: Option<i64>,
}

impl VisitQuery {
    pub fn range_request(&self) -> RangeRequest {
        RangeRequest {
            shortcut: self.range,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }

    pub fn filters(&self) -> ReportFilters {
        ReportFilters {
            level: self.level.clone(),
            status: self.status,
        }
    }
}

/// Attribute filters applied on top of the date range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilters {
    /// Raw level code as sent by the client; checked by the services
    pub level: Option<String>,
    pub status: Option<VisitStatus>,
}

/// Paginated visit listing
#[derive(Debug, Serialize, ToSchema)]
pub struct VisitPage {
    pub visits: Vec<VisitRecord>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Bulk action over selected visits
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BulkActionRequest {
    pub action: BulkActionKind,
    pub visitor_ids: Vec<i32>,
}

/// Outcome of a bulk action
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BulkActionResult {
    pub action: BulkActionKind,
    pub requested: usize,
    pub succeeded: usize,
}

/// Active-visit lookup result for the exit desk
#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveVisitLookup {
    pub visitor: Option<VisitRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(level: &str, course: Option<&str>, stream: Option<&str>) -> VisitRecord {
        VisitRecord {
            id: 1,
            name: "Asha".to_string(),
            visit_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            visit_day: "Monday".to_string(),
            entry_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            exit_time: None,
            purpose: "Reading".to_string(),
            details: VisitorDetails::Student {
                roll_no: "R1".to_string(),
                level: level.to_string(),
                course: course.map(String::from),
                year: None,
                jc_year: None,
                jc_stream: stream.map(String::from),
            },
        }
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_time_of_day("17:05:42"), NaiveTime::from_hms_opt(17, 5, 42));
        assert_eq!(parse_time_of_day("9h30"), None);
        assert_eq!(parse_time_of_day("25:00"), None);
    }

    #[test]
    fn test_course_key_uses_stream_for_jc() {
        let jc = student("JC", Some(JC_COURSE_PLACEHOLDER), Some("Science"));
        assert_eq!(jc.course_key(), Some("Science"));

        let ug = student("UG", Some("BSc IT"), None);
        assert_eq!(ug.course_key(), Some("BSc IT"));
    }

    #[test]
    fn test_serialized_shape_is_flat() {
        let mut record = student("UG", Some("BCom"), None);
        record.exit_time = NaiveTime::from_hms_opt(10, 15, 30);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "student");
        assert_eq!(json["level"], "UG");
        assert_eq!(json["entry_time"], "09:00");
        assert_eq!(json["exit_time"], "10:15");
        assert_eq!(json["visit_date"], "2024-03-04");
    }

    #[test]
    fn test_record_query_matches() {
        let record = student("PG", Some("MSc"), None);
        let day = record.visit_date;

        let query = RecordQuery {
            range: Some(DateRange::new(day, day).unwrap()),
            level: Some("PG".to_string()),
            status: Some(VisitStatus::Active),
        };
        assert!(query.matches(&record));

        let exited = RecordQuery {
            status: Some(VisitStatus::Exited),
            ..RecordQuery::default()
        };
        assert!(!exited.matches(&record));

        let other_level = RecordQuery {
            level: Some("UG".to_string()),
            ..RecordQuery::default()
        };
        assert!(!other_level.matches(&record));
    }

    #[test]
    fn test_level_filter_ignores_case_and_padding() {
        let record = student(" ug ", Some("BSc"), None);
        let query = RecordQuery {
            level: Some("UG".to_string()),
            ..RecordQuery::default()
        };
        assert!(query.matches(&record));
        assert_eq!(Level::from_code(record.level().unwrap()), Some(Level::Ug));
    }
}
