mod bootstrap;

use a2w_core::formatting::{format_report_line, format_summary};
use a2w_core::models::BatchReport;
use a2w_core::settings::Settings;
use a2w_runtime::batch::BatchConverter;
use anyhow::{Context, Result};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("A2W converter v{} starting", env!("CARGO_PKG_VERSION"));
    for warning in &settings.config_warnings {
        tracing::warn!("{}", warning);
    }

    let options = settings.to_options()?;
    tracing::debug!(
        "Format: {}, fields: {}/{}, recursive: {}",
        options.format,
        options.fields.time,
        options.fields.value,
        options.recursive
    );

    let converter = BatchConverter::new(options);
    // Only directory-level failures reach this `?`; per-file errors are in
    // the report and do not change the exit status.
    let report = converter.run().with_context(|| {
        format!(
            "cannot convert exports in {}",
            converter.options().input_dir.display()
        )
    })?;

    print_report(&report);

    Ok(())
}

fn print_report(report: &BatchReport) {
    for converted in &report.converted {
        println!(
            "{} -> {}",
            converted.source.display(),
            converted.output.display()
        );
        for line in format_summary(&converted.summary) {
            println!("   {}", line);
        }
    }

    for failed in &report.failed {
        eprintln!(
            "   ✗ {} [{}]: {}",
            failed.source.display(),
            failed.error.kind(),
            failed.error
        );
    }

    println!("{}", format_report_line(report));
}
