//! Human-readable rendering of per-series summaries and the batch report.

use crate::models::{BatchReport, SeriesSummary};

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use a2w_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let factor = 10_f64.powi(decimals as i32);
    let rounded = (value.abs() * factor).round() / factor;

    let grouped = group_thousands(&(rounded.trunc() as u64).to_string());
    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", rounded.fract(), prec = decimals as usize);
        // "0.50" -> ".50"
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && rounded != 0.0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a row count with thousands separators.
///
/// ```
/// use a2w_core::formatting::format_count;
///
/// assert_eq!(format_count(1_048_575), "1,048,575");
/// ```
pub fn format_count(n: usize) -> String {
    group_thousands(&n.to_string())
}

/// Render the summary printed after a file is converted.
pub fn format_summary(summary: &SeriesSummary) -> Vec<String> {
    let mut lines = vec![format!("Total rows: {}", format_count(summary.rows))];

    if summary.missing_values > 0 {
        lines.push(format!(
            "Missing values: {}",
            format_count(summary.missing_values)
        ));
    }

    if let (Some(earliest), Some(latest)) = (summary.earliest, summary.latest) {
        lines.push(format!(
            "Date range: {} to {}",
            earliest.format("%Y-%m-%d %H:%M:%S"),
            latest.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    match (summary.min_value, summary.max_value) {
        (Some(min), Some(max)) => lines.push(format!(
            "Value range: {} to {}",
            format_number(min, 2),
            format_number(max, 2)
        )),
        _ => lines.push("Value range: no values".to_string()),
    }

    lines
}

/// One-line outcome of a batch, e.g. `"3 converted, 1 failed"`.
pub fn format_report_line(report: &BatchReport) -> String {
    if report.total() == 0 {
        return "No JSON files found".to_string();
    }
    format!(
        "{} converted, {} failed",
        report.converted.len(),
        report.failed.len()
    )
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);
    for (i, c) in s.chars().enumerate() {
        if i != 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}
