//! Shared domain enums

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// VisitorKind
// ---------------------------------------------------------------------------

/// Which visit log a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisitorKind {
    Student,
    Teacher,
}

impl VisitorKind {
    /// Backing table for this kind of visit
    pub fn table(self) -> &'static str {
        match self {
            VisitorKind::Student => "visitors",
            VisitorKind::Teacher => "teacher_visits",
        }
    }
}

impl std::fmt::Display for VisitorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VisitorKind::Student => "student",
            VisitorKind::Teacher => "teacher",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Academic level of a student visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Level {
    /// Junior college
    #[serde(rename = "JC")]
    Jc,
    /// Undergraduate
    #[serde(rename = "UG")]
    Ug,
    /// Postgraduate
    #[serde(rename = "PG")]
    Pg,
}

impl Level {
    /// Display order used by level breakdowns
    pub const ALL: [Level; 3] = [Level::Jc, Level::Ug, Level::Pg];

    pub fn as_code(self) -> &'static str {
        match self {
            Level::Jc => "JC",
            Level::Ug => "UG",
            Level::Pg => "PG",
        }
    }

    /// Parse a stored level code (case-insensitive, surrounding blanks ignored)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "JC" => Some(Level::Jc),
            "UG" => Some(Level::Ug),
            "PG" => Some(Level::Pg),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

// ---------------------------------------------------------------------------
// VisitStatus
// ---------------------------------------------------------------------------

/// Presence status filter: still on site, or already left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Active,
    Exited,
}

// ---------------------------------------------------------------------------
// BulkActionKind
// ---------------------------------------------------------------------------

/// Administrative actions applicable to a selection of visits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BulkActionKind {
    MarkExit,
    Delete,
}
