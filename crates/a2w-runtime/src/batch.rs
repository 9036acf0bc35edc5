//! Sequential batch conversion.
//!
//! [`BatchConverter`] discovers the exports in one directory and runs
//! read → parse → write for each of them in turn. A failing file is logged
//! and recorded in the [`BatchReport`]; only directory-level problems stop
//! the run. Two sources that map to the same output file (`KANS.json` and
//! `KANS.JSON`, or same-named files from different subdirectories written
//! into one `--output-dir`) never overwrite each other: the later one fails.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use a2w_core::error::{ConvertError, Result};
use a2w_core::formatting::format_summary;
use a2w_core::models::{BatchReport, ConvertedFile, FailedFile, SeriesId};
use a2w_core::settings::ConvertOptions;
use a2w_data::analysis::summarize;
use a2w_data::reader::{find_json_files, read_series};
use a2w_data::writer::{build_rows, output_path, write_spreadsheet};
use tracing::{debug, info, info_span, warn};

// ── BatchConverter ────────────────────────────────────────────────────────────

/// Converts every JSON export in a directory into a spreadsheet.
///
/// # Example
/// ```no_run
/// use a2w_core::settings::ConvertOptions;
/// use a2w_runtime::batch::BatchConverter;
///
/// let report = BatchConverter::new(ConvertOptions::default()).run()?;
/// println!("{} converted", report.converted.len());
/// # Ok::<(), a2w_core::error::ConvertError>(())
/// ```
pub struct BatchConverter {
    options: ConvertOptions,
}

impl BatchConverter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert all discovered files.
    ///
    /// Returns `Err` only for a [`ConvertError::Directory`]: the input
    /// directory cannot be listed or the output directory cannot be created.
    pub fn run(&self) -> Result<BatchReport> {
        let files = find_json_files(&self.options.input_dir, self.options.recursive)?;
        let mut report = BatchReport::default();

        if files.is_empty() {
            info!(
                "No JSON files found in {}",
                self.options.input_dir.display()
            );
            return Ok(report);
        }

        if let Some(dir) = &self.options.output_dir {
            std::fs::create_dir_all(dir).map_err(|source| ConvertError::Directory {
                path: dir.clone(),
                source,
            })?;
        }

        info!(
            "Converting {} JSON files from {}",
            files.len(),
            self.options.input_dir.display()
        );

        // Output path -> the source that produced it during this run.
        let mut written: HashMap<PathBuf, PathBuf> = HashMap::new();

        for source in files {
            let output = self.output_for(&source);
            let result = match written.get(&output) {
                Some(previous) => Err(ConvertError::OutputCollision {
                    path: source.clone(),
                    output,
                    previous: previous.clone(),
                }),
                None => self.convert_to(&source, output),
            };

            match result {
                Ok(converted) => {
                    written.insert(converted.output.clone(), converted.source.clone());
                    report.converted.push(converted);
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    warn!(
                        "{} [{}]: {}",
                        display_name(&source),
                        error.kind(),
                        error
                    );
                    report.failed.push(FailedFile { source, error });
                }
            }
        }

        Ok(report)
    }

    /// Read, parse and write one export.
    ///
    /// Parsing finishes before the output is opened, so a parse failure never
    /// leaves a spreadsheet behind.
    pub fn convert_file(&self, source: &Path) -> Result<ConvertedFile> {
        self.convert_to(source, self.output_for(source))
    }

    fn output_for(&self, source: &Path) -> PathBuf {
        output_path(
            source,
            self.options.output_dir.as_deref(),
            self.options.format,
        )
    }

    fn convert_to(&self, source: &Path, output: PathBuf) -> Result<ConvertedFile> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let series = SeriesId::parse(&stem)
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let span = info_span!("convert", file = %display_name(source), series = %series);
        let _guard = span.enter();

        info!("Reading {}", source.display());
        let records = read_series(source, &self.options.fields)?;
        let rows = build_rows(&records, self.options.timestamps);

        info!("Writing to {}", output.display());
        write_spreadsheet(&output, &rows, self.options.format)?;

        let summary = summarize(&rows);
        for line in format_summary(&summary) {
            debug!("{}", line);
        }
        info!(
            "Converted {} rows to {}",
            summary.rows,
            display_name(&output)
        );

        Ok(ConvertedFile {
            source: source.to_path_buf(),
            output,
            summary,
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Convenience wrapper: run a batch over `dir` with otherwise default options.
pub fn convert_directory(dir: impl Into<PathBuf>) -> Result<BatchReport> {
    BatchConverter::new(ConvertOptions {
        input_dir: dir.into(),
        ..Default::default()
    })
    .run()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
