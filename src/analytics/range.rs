//! Date range resolution for reports

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Named preset ranges, relative to the server's current date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RangeShortcut {
    Today,
    Yesterday,
    /// The last 7 days plus today
    Week,
    /// The last 30 days plus today
    Month,
}

/// Longest explicit range a report may cover, in days
pub const MAX_RANGE_DAYS: i64 = 366;

/// Errors raised while resolving a date range
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Invalid {field} '{value}', expected YYYY-MM-DD")]
    MalformedDate { field: &'static str, value: String },

    #[error("Start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("Range covers {days} days, at most {max} are allowed")]
    TooLong { days: i64, max: i64 },
}

/// Inclusive calendar date interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of calendar days covered, bounds included
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every date of the range in ascending order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.num_days() as usize)
    }
}

/// What a client asked for: a shortcut, or explicit (possibly missing) bounds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeRequest {
    pub shortcut: Option<RangeShortcut>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeRequest {
    pub fn shortcut(shortcut: RangeShortcut) -> Self {
        Self {
            shortcut: Some(shortcut),
            ..Self::default()
        }
    }

    pub fn explicit(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            shortcut: None,
            start_date: Some(start_date.into()),
            end_date: Some(end_date.into()),
        }
    }
}

/// Resolve a range request against `today`.
///
/// A shortcut wins over explicit bounds. Missing, empty or `"null"` bounds
/// default to `today` before the ordering check. Explicit ranges longer
/// than `MAX_RANGE_DAYS` are rejected.
pub fn resolve(request: &RangeRequest, today: NaiveDate) -> Result<DateRange, RangeError> {
    if let Some(shortcut) = request.shortcut {
        return Ok(resolve_shortcut(shortcut, today));
    }

    let start = parse_bound("start_date", request.start_date.as_deref())?.unwrap_or(today);
    let end = parse_bound("end_date", request.end_date.as_deref())?.unwrap_or(today);
    let range = DateRange::new(start, end)?;
    let days = range.num_days();
    if days > MAX_RANGE_DAYS {
        return Err(RangeError::TooLong {
            days,
            max: MAX_RANGE_DAYS,
        });
    }
    Ok(range)
}

pub fn resolve_shortcut(shortcut: RangeShortcut, today: NaiveDate) -> DateRange {
    match shortcut {
        RangeShortcut::Today => DateRange::single(today),
        RangeShortcut::Yesterday => DateRange::single(today - Duration::days(1)),
        RangeShortcut::Week => DateRange {
            start: today - Duration::days(7),
            end: today,
        },
        RangeShortcut::Month => DateRange {
            start: today - Duration::days(30),
            end: today,
        },
    }
}

fn parse_bound(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, RangeError> {
    let raw = match raw.map(str::trim) {
        None | Some("") | Some("null") => return Ok(None),
        Some(raw) => raw,
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| RangeError::MalformedDate {
            field,
            value: raw.to_string(),
        })
}
