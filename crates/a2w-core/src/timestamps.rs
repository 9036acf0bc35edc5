use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

// ── TimestampParser ───────────────────────────────────────────────────────────

/// Parses the timestamp cell of an A2W export entry.
pub struct TimestampParser;

impl TimestampParser {
    /// Attempt to parse a [`serde_json::Value`] into an offset-aware
    /// [`DateTime`].
    ///
    /// Handles:
    /// * JSON string → ISO 8601 / RFC 3339 (including `Z`-suffix), or a
    ///   common naive date-time pattern which is read as UTC.
    /// * JSON number → Unix timestamp in **milliseconds**, the unit used by
    ///   CWMS data exports.
    /// * anything else → `None`.
    pub fn parse(value: &Value) -> Option<DateTime<FixedOffset>> {
        match value {
            Value::String(s) => Self::parse_str(s.trim()),
            Value::Number(n) => {
                let millis = if let Some(ms) = n.as_i64() {
                    ms
                } else {
                    let f = n.as_f64()?;
                    if !f.is_finite() {
                        return None;
                    }
                    f.round() as i64
                };
                DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.fixed_offset())
            }
            _ => None,
        }
    }

    /// Parse a timestamp string.
    pub fn parse_str(s: &str) -> Option<DateTime<FixedOffset>> {
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt);
        }

        // ISO 8601 with a compact offset, e.g. "2025-01-01T00:00:00-0600".
        const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
                return Some(dt);
            }
        }

        const NAIVE_FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M",
            "%m/%d/%Y %H:%M:%S",
            "%m/%d/%Y %H:%M",
        ];
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Utc.from_utc_datetime(&naive).fixed_offset());
            }
        }

        const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                let naive = date.and_hms_opt(0, 0, 0)?;
                return Some(Utc.from_utc_datetime(&naive).fixed_offset());
            }
        }

        debug!("TimestampParser: could not parse \"{}\"", s);
        None
    }
}
