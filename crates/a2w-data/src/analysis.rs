//! Per-series descriptive statistics reported after each conversion.

use a2w_core::models::SeriesSummary;

use crate::writer::SheetRow;

/// Summarise the rows written for one series.
///
/// The date range is chronological even when the rows are not sorted.
pub fn summarize(rows: &[SheetRow]) -> SeriesSummary {
    let mut summary = SeriesSummary {
        rows: rows.len(),
        earliest: rows.iter().map(|r| r.datetime).min(),
        latest: rows.iter().map(|r| r.datetime).max(),
        ..Default::default()
    };

    for row in rows {
        match row.value {
            Some(v) if v.is_finite() => {
                summary.min_value = Some(summary.min_value.map_or(v, |m| m.min(v)));
                summary.max_value = Some(summary.max_value.map_or(v, |m| m.max(v)));
            }
            Some(_) => {}
            None => summary.missing_values += 1,
        }
    }

    summary
}
