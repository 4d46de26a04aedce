//! Query window for a run.

use crate::models::DateRange;
use chrono::{Days, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeStrategy {
    /// Backfill: the same range on every run.
    Fixed(DateRange),
    /// Incremental: yesterday through today.
    RelativeToNow,
}

impl RangeStrategy {
    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        match self {
            RangeStrategy::Fixed(range) => *range,
            RangeStrategy::RelativeToNow => yesterday_through_today(today),
        }
    }
}

pub fn yesterday_through_today(today: NaiveDate) -> DateRange {
    // NaiveDate::MIN has no predecessor; clamp rather than panic.
    let start = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    DateRange { start, end: today }
}
