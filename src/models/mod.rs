//! Data models for Visitlog

pub mod enums;
pub mod visit;

// Re-export commonly used types
pub use enums::{BulkActionKind, Level, VisitStatus, VisitorKind};
pub use visit::{NewVisit, RecordQuery, ReportFilters, VisitRecord, VisitorDetails};
