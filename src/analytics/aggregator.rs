//! Visit log aggregation
//!
//! Turns a filtered set of visit records into the statistics and chart
//! series shown on the dashboard. Aggregation is a single pass over the
//! records with no state kept between calls.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike};
use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use super::duration::{duration_bucket, DURATION_BUCKET_LABELS};
use super::range::DateRange;
use crate::models::{Level, VisitRecord, VisitorKind};

/// Bucket label for records with a missing or blank attribute
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Chart-ready series: labels and values aligned by index
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
}

impl Series {
    fn push(&mut self, label: impl Into<String>, value: i64) {
        self.labels.push(label.into());
        self.values.push(value);
    }

    /// Sum of all values
    pub fn total(&self) -> i64 {
        self.values.iter().sum()
    }

    /// Value attached to `label`, if present
    pub fn value_of(&self, label: &str) -> Option<i64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|idx| self.values[idx])
    }
}

/// Headline figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScalarStats {
    /// Number of visits
    pub total: i64,
    /// Visits without an exit time
    pub active: i64,
    /// Mean duration in minutes over visits with an exit time, one decimal
    pub avg_duration: f64,
}

/// Figures only meaningful over the whole history
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeStats {
    /// Distinct dates with at least one visit
    pub days_of_operation: i64,
    /// Visits per day of operation, one decimal
    pub avg_daily: f64,
}

/// Categorical dimension a breakdown groups by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakdown {
    Level,
    Course,
    Purpose,
}

/// Selects which series an aggregation produces
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    pub breakdowns: Vec<Breakdown>,
    /// Queried interval; the daily trend covers it day by day.
    /// Without it the trend spans the first to the last observed date.
    pub range: Option<DateRange>,
    /// Compute [`LifetimeStats`]
    pub lifetime: bool,
}

impl AggregateOptions {
    /// Breakdowns shown for each visit log
    pub fn for_kind(kind: VisitorKind) -> Self {
        let breakdowns = match kind {
            VisitorKind::Student => vec![Breakdown::Level, Breakdown::Course, Breakdown::Purpose],
            VisitorKind::Teacher => vec![Breakdown::Purpose],
        };
        Self {
            breakdowns,
            range: None,
            lifetime: false,
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_lifetime(mut self) -> Self {
        self.lifetime = true;
        self
    }

    fn wants(&self, breakdown: Breakdown) -> bool {
        self.breakdowns.contains(&breakdown)
    }
}

/// Everything derived from one record set
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub stats: ScalarStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_data: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_data: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose_data: Option<Series>,
    pub daily_trend: Series,
    pub peak_hours: Series,
    pub duration_histogram: Series,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<LifetimeStats>,
}

/// Running counters for a single aggregation pass
#[derive(Default)]
struct Tally {
    total: i64,
    active: i64,
    duration_sum: i64,
    duration_count: i64,
    histogram: [i64; DURATION_BUCKET_LABELS.len()],
    hours: [i64; 24],
    daily: BTreeMap<NaiveDate, i64>,
    known_levels: [i64; Level::ALL.len()],
    other_levels: IndexMap<String, i64>,
    courses: IndexMap<String, i64>,
    purposes: IndexMap<String, i64>,
}

impl Tally {
    fn add(&mut self, record: &VisitRecord) {
        self.total += 1;
        if record.is_active() {
            self.active += 1;
        }
        if let Some(minutes) = record.duration_minutes() {
            self.duration_sum += minutes;
            self.duration_count += 1;
            self.histogram[duration_bucket(minutes)] += 1;
        }
        self.hours[record.entry_time.hour() as usize] += 1;
        *self.daily.entry(record.visit_date).or_insert(0) += 1;

        if let Some(raw) = record.level() {
            match Level::from_code(raw) {
                Some(level) => self.known_levels[level_index(level)] += 1,
                None => *self.other_levels.entry(category_label(Some(raw))).or_insert(0) += 1,
            }
            *self.courses.entry(category_label(record.course_key())).or_insert(0) += 1;
        }
        *self
            .purposes
            .entry(category_label(Some(record.purpose.as_str())))
            .or_insert(0) += 1;
    }
}

/// Stateless aggregation engine configured with an output shape
#[derive(Debug, Clone)]
pub struct Aggregator {
    options: AggregateOptions,
}

impl Aggregator {
    pub fn new(options: AggregateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    pub fn aggregate(&self, records: &[VisitRecord]) -> AggregateResult {
        let mut tally = Tally::default();
        for record in records {
            tally.add(record);
        }

        let avg_duration = if tally.duration_count > 0 {
            round1(tally.duration_sum as f64 / tally.duration_count as f64)
        } else {
            0.0
        };

        let lifetime = self.options.lifetime.then(|| {
            let days = tally.daily.len() as i64;
            LifetimeStats {
                days_of_operation: days,
                avg_daily: if days > 0 {
                    round1(tally.total as f64 / days as f64)
                } else {
                    0.0
                },
            }
        });

        AggregateResult {
            stats: ScalarStats {
                total: tally.total,
                active: tally.active,
                avg_duration,
            },
            level_data: self
                .options
                .wants(Breakdown::Level)
                .then(|| level_series(&tally)),
            course_data: self
                .options
                .wants(Breakdown::Course)
                .then(|| ranked_series(&tally.courses)),
            purpose_data: self
                .options
                .wants(Breakdown::Purpose)
                .then(|| ranked_series(&tally.purposes)),
            daily_trend: daily_series(&tally.daily, self.options.range),
            peak_hours: hour_series(&tally.hours),
            duration_histogram: histogram_series(&tally.histogram),
            lifetime,
        }
    }
}

fn level_index(level: Level) -> usize {
    match level {
        Level::Jc => 0,
        Level::Ug => 1,
        Level::Pg => 2,
    }
}

fn category_label(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => UNKNOWN_LABEL.to_string(),
    }
}

/// Round half away from zero to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Known levels first in JC, UG, PG order, then unrecognized codes as first seen
fn level_series(tally: &Tally) -> Series {
    let mut series = Series::default();
    for level in Level::ALL {
        let count = tally.known_levels[level_index(level)];
        if count > 0 {
            series.push(level.as_code(), count);
        }
    }
    for (label, count) in &tally.other_levels {
        series.push(label.as_str(), *count);
    }
    series
}

/// Descending count; `sort_by` is stable so ties keep first-seen order
fn ranked_series(counts: &IndexMap<String, i64>) -> Series {
    let mut entries: Vec<(&String, &i64)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));

    let mut series = Series::default();
    for (label, count) in entries {
        series.push(label.as_str(), *count);
    }
    series
}

fn daily_series(daily: &BTreeMap<NaiveDate, i64>, range: Option<DateRange>) -> Series {
    let span = range.or_else(|| {
        let first = daily.keys().next()?;
        let last = daily.keys().next_back()?;
        Some(DateRange {
            start: *first,
            end: *last,
        })
    });

    let mut series = Series::default();
    if let Some(span) = span {
        for day in span.days() {
            let count = daily.get(&day).copied().unwrap_or(0);
            series.push(day.format("%Y-%m-%d").to_string(), count);
        }
    }
    series
}

fn hour_series(hours: &[i64; 24]) -> Series {
    let mut series = Series::default();
    for (hour, count) in hours.iter().enumerate() {
        series.push(format!("{:02}:00", hour), *count);
    }
    series
}

fn histogram_series(histogram: &[i64; DURATION_BUCKET_LABELS.len()]) -> Series {
    let mut series = Series::default();
    for (label, count) in DURATION_BUCKET_LABELS.iter().zip(histogram) {
        series.push(*label, *count);
    }
    series
}
