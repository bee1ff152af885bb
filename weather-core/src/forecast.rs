use chrono::{NaiveDate, TimeZone};
use std::collections::HashSet;

use crate::model::ForecastEntry;

/// Calendar date of an entry as seen in `tz`.
pub fn local_date<Tz: TimeZone>(entry: &ForecastEntry, tz: &Tz) -> NaiveDate {
    entry.time.with_timezone(tz).date_naive()
}

/// Keep the first entry of every calendar day in `tz`, in order of first appearance.
///
/// This picks a representative reading, not a daily aggregate.
pub fn daily_representatives<Tz: TimeZone>(
    entries: Vec<ForecastEntry>,
    tz: &Tz,
) -> Vec<ForecastEntry> {
    let mut seen = HashSet::new();

    entries
        .into_iter()
        .filter(|e| seen.insert(local_date(e, tz)))
        .collect()
}
