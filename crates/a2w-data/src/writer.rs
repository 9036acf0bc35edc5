//! Spreadsheet output: one two-column sheet (`datetime`, `value`) per series.

use std::path::{Path, PathBuf};

use a2w_core::error::{ConvertError, Result};
use a2w_core::models::{OutputFormat, TimeValueRecord, TimestampMode};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tracing::{debug, warn};

/// Column headers of every output file.
pub const HEADERS: [&str; 2] = ["datetime", "value"];

/// Data rows available in one XLSX worksheet (the header takes one row).
pub const XLSX_MAX_DATA_ROWS: usize = 1_048_575;

const XLSX_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const CSV_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// One output row with the timestamp already flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub datetime: NaiveDateTime,
    pub value: Option<f64>,
}

/// Flatten records into sheet rows, keeping their order.
pub fn build_rows(records: &[TimeValueRecord], mode: TimestampMode) -> Vec<SheetRow> {
    records
        .iter()
        .map(|r| SheetRow {
            datetime: r.naive_timestamp(mode),
            value: r.value,
        })
        .collect()
}

/// Output path for `source`: same stem, the format's extension, placed in
/// `output_dir` or next to the source.
pub fn output_path(source: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| source.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = source.file_stem().unwrap_or(source.as_os_str());

    let mut name = stem.to_os_string();
    name.push(".");
    name.push(format.extension());
    dir.join(name)
}

/// Write `rows` to `path`, replacing any existing file.
///
/// A file left half-written by a failure is removed.
pub fn write_spreadsheet(path: &Path, rows: &[SheetRow], format: OutputFormat) -> Result<()> {
    let result = match format {
        OutputFormat::Xlsx => write_xlsx(path, rows),
        OutputFormat::Csv => write_csv(path, rows),
    };

    if result.is_err() && path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove partial output {}: {}", path.display(), e);
        }
    }
    if result.is_ok() {
        debug!("Wrote {} rows to {}", rows.len(), path.display());
    }
    result
}

// ── XLSX ──────────────────────────────────────────────────────────────────────

fn write_xlsx(path: &Path, rows: &[SheetRow]) -> Result<()> {
    if rows.len() > XLSX_MAX_DATA_ROWS {
        return Err(ConvertError::Spreadsheet {
            path: path.to_path_buf(),
            source: format!(
                "{} rows exceed the worksheet limit of {}",
                rows.len(),
                XLSX_MAX_DATA_ROWS
            )
            .into(),
        });
    }

    let xlsx_error = |e: XlsxError| match e {
        XlsxError::IoError(source) => ConvertError::FileWrite {
            path: path.to_path_buf(),
            source,
        },
        other => ConvertError::Spreadsheet {
            path: path.to_path_buf(),
            source: other.to_string().into(),
        },
    };

    let header = Format::new().set_bold();
    let datetime = Format::new().set_num_format(XLSX_DATETIME_FORMAT);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, title) in HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *title, &header)
            .map_err(xlsx_error)?;
    }
    sheet.set_column_width(0, 20).map_err(xlsx_error)?;
    sheet.set_column_width(1, 12).map_err(xlsx_error)?;
    sheet.set_freeze_panes(1, 0).map_err(xlsx_error)?;

    for (i, row) in rows.iter().enumerate() {
        // Bounded by XLSX_MAX_DATA_ROWS above.
        let r = (i + 1) as u32;
        sheet
            .write_datetime_with_format(r, 0, &row.datetime, &datetime)
            .map_err(xlsx_error)?;
        if let Some(v) = row.value {
            sheet.write_number(r, 1, v).map_err(xlsx_error)?;
        }
    }

    workbook.save(path).map_err(xlsx_error)
}

// ── CSV ───────────────────────────────────────────────────────────────────────

fn write_csv(path: &Path, rows: &[SheetRow]) -> Result<()> {
    let csv_error = |e: csv::Error| match e.into_kind() {
        csv::ErrorKind::Io(source) => ConvertError::FileWrite {
            path: path.to_path_buf(),
            source,
        },
        other => ConvertError::Spreadsheet {
            path: path.to_path_buf(),
            source: format!("{:?}", other).into(),
        },
    };

    let file = std::fs::File::create(path).map_err(|source| ConvertError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(HEADERS).map_err(csv_error)?;
    for row in rows {
        let datetime = row.datetime.format(CSV_DATETIME_FORMAT).to_string();
        let value = row.value.map(|v| v.to_string()).unwrap_or_default();
        writer
            .write_record([datetime.as_str(), value.as_str()])
            .map_err(csv_error)?;
    }

    writer.flush().map_err(|source| ConvertError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}
