//! ClickHouse table definitions.
//!
//! Table columns are derived from the same mapping tables that drive the
//! normalizer. Inserts name their columns from the row structs instead; the
//! tests below keep the two in agreement.

use crate::models::{ForecastRow, ObservationRow, WeatherRow};

/// Columns shared by every row kind, in insert order
pub const HEADER_COLUMNS: &[(&str, &str)] = &[
    ("Location", "String"),
    ("ObservationTime", "DateTime('UTC')"),
    ("CreationTime", "DateTime('UTC')"),
];

/// Column names and types of row kind `R`, in insert order
pub fn columns<R: WeatherRow>() -> Vec<(&'static str, &'static str)> {
    HEADER_COLUMNS
        .iter()
        .copied()
        .chain(R::mappings().iter().map(|m| (m.column, m.column_type.sql())))
        .collect()
}

/// `CREATE TABLE IF NOT EXISTS` statement for row kind `R`.
///
/// Re-collecting the same window stores newer copies of a row; the
/// replacing engine keeps the one with the latest `CreationTime`.
pub fn create_table_statement<R: WeatherRow>() -> String {
    let columns = columns::<R>()
        .into_iter()
        .map(|(name, sql_type)| format!("    {} {}", name, sql_type))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n) ENGINE = ReplacingMergeTree(CreationTime)\nORDER BY (Location, ObservationTime)",
        R::KIND.table(),
        columns
    )
}

/// Statements for every table the collector writes to
pub fn all_statements() -> Vec<String> {
    vec![
        create_table_statement::<ObservationRow>(),
        create_table_statement::<ForecastRow>(),
    ]
}
