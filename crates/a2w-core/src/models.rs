use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// A single `(timestamp, value)` observation extracted from an export.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeValueRecord {
    /// Observation time, carrying the offset found in the source.
    pub timestamp: DateTime<FixedOffset>,
    /// Measured value; `None` when the reading is missing.
    pub value: Option<f64>,
}

impl TimeValueRecord {
    pub fn new(timestamp: DateTime<FixedOffset>, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }

    /// Timestamp with the offset dropped, as written to a spreadsheet cell.
    pub fn naive_timestamp(&self, mode: TimestampMode) -> NaiveDateTime {
        match mode {
            TimestampMode::SourceLocal => self.timestamp.naive_local(),
            TimestampMode::Utc => self.timestamp.naive_utc(),
        }
    }
}

/// How an offset-aware timestamp is flattened for spreadsheet output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampMode {
    /// Keep the wall-clock time of the source offset.
    #[default]
    #[serde(rename = "local")]
    SourceLocal,
    /// Convert to UTC first.
    Utc,
}

/// Spreadsheet flavour written for each source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
}

impl OutputFormat {
    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(OutputFormat::Xlsx),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(ConvertError::Config(format!(
                "unknown output format \"{}\"",
                other
            ))),
        }
    }
}

/// Names of the object keys holding the timestamp and the value of an entry.
///
/// Matching is case-sensitive: these are a contract with the upstream export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNames {
    pub time: String,
    pub value: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            time: "time".to_string(),
            value: "value".to_string(),
        }
    }
}

// ── Series id ─────────────────────────────────────────────────────────────────

/// Time-series identifier parsed from an export's file name, e.g.
/// `KANS.Flow-In.Ave.1Day.1Day` or `KANS.Stage.Inst.1Hour.0.Ccp-Rev`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesId {
    pub location: String,
    pub parameter: String,
    pub kind: String,
    pub interval: String,
    pub duration: String,
    pub version: Option<String>,
}

fn series_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<location>[^.]+)\.(?P<parameter>[^.]+)\.(?P<kind>[^.]+)\.(?P<interval>[^.]+)\.(?P<duration>[^.]+)(?:\.(?P<version>.+))?$",
        )
        .expect("series id pattern is valid")
    })
}

impl SeriesId {
    /// Parse a file stem. Returns `None` when the stem has fewer than five
    /// dot-separated parts.
    pub fn parse(stem: &str) -> Option<Self> {
        let caps = series_id_pattern().captures(stem)?;
        Some(Self {
            location: caps["location"].to_string(),
            parameter: caps["parameter"].to_string(),
            kind: caps["kind"].to_string(),
            interval: caps["interval"].to_string(),
            duration: caps["duration"].to_string(),
            version: caps.name("version").map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}",
            self.location, self.parameter, self.kind, self.interval, self.duration
        )?;
        if let Some(v) = &self.version {
            write!(f, ".{}", v)?;
        }
        Ok(())
    }
}

// ── Summaries ─────────────────────────────────────────────────────────────────

/// Descriptive statistics for one converted series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesSummary {
    /// Number of data rows written.
    pub rows: usize,
    /// Rows whose value cell is empty.
    pub missing_values: usize,
    /// Earliest and latest timestamp, whatever order the rows are in.
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
    /// Smallest and largest non-null value.
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

/// A source file that was converted successfully.
#[derive(Debug, Clone)]
pub struct ConvertedFile {
    pub source: PathBuf,
    pub output: PathBuf,
    pub summary: SeriesSummary,
}

/// A source file that could not be converted.
#[derive(Debug)]
pub struct FailedFile {
    pub source: PathBuf,
    pub error: ConvertError,
}

/// Outcome of a whole batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<ConvertedFile>,
    pub failed: Vec<FailedFile>,
}

impl BatchReport {
    /// Number of JSON files that were attempted.
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
