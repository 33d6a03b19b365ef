//! Grouping of WFS members into fixed-schema rows.
//!
//! Members are accumulated per timestamp. The first member seen for a
//! timestamp creates its row and fixes `Location`, `ObservationTime` and
//! `CreationTime`; every member then applies its value through the row
//! kind's mapping table. Values that do not parse as numbers, and NaN, are
//! stored as zero. Parameters missing from the table are skipped.
//!
//! Rows are returned in ascending timestamp order.

use crate::models::{Member, WeatherRow};
use chrono::{DateTime, SubsecRound, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// Normalize members into rows, stamping them with the current time
pub fn normalize<R: WeatherRow>(members: &[Member], location: &str) -> Vec<R> {
    normalize_at(members, location, Utc::now().trunc_subsecs(0))
}

/// Normalize members into rows that all share `captured_at` as creation time
pub fn normalize_at<R: WeatherRow>(
    members: &[Member],
    location: &str,
    captured_at: DateTime<Utc>,
) -> Vec<R> {
    let mut rows: BTreeMap<DateTime<Utc>, R> = BTreeMap::new();
    let mut coerced = 0usize;
    let mut skipped = 0usize;

    for member in members {
        let row = rows
            .entry(member.time)
            .or_insert_with(|| R::new(location, member.time, captured_at));

        let (value, was_coerced) = coerce_value(&member.value);
        if was_coerced {
            coerced += 1;
        }

        match R::mapping(&member.name) {
            Some(mapping) => (mapping.apply)(row, value),
            None => skipped += 1,
        }
    }

    debug!(
        "Normalized {} members into {} {} rows for {} ({} coerced to zero, {} unknown parameters)",
        members.len(),
        rows.len(),
        R::KIND.table(),
        location,
        coerced,
        skipped
    );

    rows.into_values().collect()
}

/// Parse a parameter value, returning zero and `true` for anything that is
/// not a number
pub fn coerce_value(raw: &str) -> (f32, bool) {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_nan() => (0.0, true),
        Ok(value) => (value as f32, false),
        Err(_) => (0.0, true),
    }
}
