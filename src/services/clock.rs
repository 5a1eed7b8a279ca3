//! Source of the server's local "now"

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Supplies the current local date and time.
/// Range shortcuts and default entry/exit times are all taken from it.
pub trait DateProvider: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock of the server, in its local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDateProvider;

impl DateProvider for SystemDateProvider {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedDateProvider {
    now: NaiveDateTime,
}

impl FixedDateProvider {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }
}

impl DateProvider for FixedDateProvider {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}
