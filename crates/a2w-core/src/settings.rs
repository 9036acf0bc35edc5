use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::models::{FieldNames, OutputFormat, TimestampMode};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Convert A2W JSON time-series exports into spreadsheets
#[derive(Parser, Debug, Clone)]
#[command(
    name = "a2w-convert",
    about = "Convert A2W JSON time-series exports into spreadsheets",
    version
)]
pub struct Settings {
    /// Directory containing the JSON exports
    #[arg(env = "A2W_INPUT_DIR", default_value = ".")]
    pub input_dir: PathBuf,

    /// Directory for the spreadsheets (defaults to the input directory)
    #[arg(long, env = "A2W_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write next to the inputs, ignoring any saved or environment output directory
    #[arg(long)]
    pub no_output_dir: bool,

    /// Output format
    #[arg(long, default_value = "xlsx", value_parser = ["xlsx", "csv"])]
    pub format: String,

    /// Timestamp key in object entries
    #[arg(long, default_value = "time")]
    pub time_field: String,

    /// Value key in object entries
    #[arg(long, default_value = "value")]
    pub value_field: String,

    /// Convert timestamps to UTC before writing
    #[arg(long, overrides_with = "no_utc")]
    pub utc: bool,

    /// Keep source wall-clock times even if a saved config asks for UTC
    #[arg(long, overrides_with = "utc")]
    pub no_utc: bool,

    /// Also convert JSON files in subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Persisted defaults file
    #[arg(long, env = "A2W_CONFIG")]
    pub config: Option<PathBuf>,

    /// Save the current format and field choices as defaults
    #[arg(long)]
    pub save_config: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Problems met while merging the config file, logged once logging is up.
    #[arg(skip)]
    pub config_warnings: Vec<String>,
}

// ── ConverterConfig ────────────────────────────────────────────────────────────

/// Persisted defaults saved to `~/.a2w-convert/config.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ConverterConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<TimestampMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl ConverterConfig {
    /// Default location, `~/.a2w-convert/config.json`.
    pub fn default_path() -> PathBuf {
        Self::path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".a2w-convert").join("config.json")
    }

    /// Load the config at `path`.
    ///
    /// A missing file yields the default config; an unreadable or malformed
    /// one is an error so the caller can report it.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConvertError::Config(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&content)
            .map_err(|e| ConvertError::Config(format!("invalid {}: {}", path.display(), e)))
    }

    /// Atomically write the config, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }
}

// ── ConvertOptions ─────────────────────────────────────────────────────────────

/// Fully resolved options handed to the batch converter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub input_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub format: OutputFormat,
    pub fields: FieldNames,
    pub timestamps: TimestampMode,
    pub recursive: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: None,
            format: OutputFormat::default(),
            fields: FieldNames::default(),
            timestamps: TimestampMode::default(),
            recursive: false,
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and merge persisted defaults.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os().collect(), None)
    }

    /// Parse `args`, merge the config file underneath any flag not given
    /// explicitly, and optionally persist the result.
    ///
    /// `config_override` replaces both `--config` and the default path; tests
    /// use it to stay inside a temp directory.
    pub fn load_from_args(args: Vec<std::ffi::OsString>, config_override: Option<&Path>) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        let config_path = config_override
            .map(Path::to_path_buf)
            .or_else(|| settings.config.clone())
            .unwrap_or_else(ConverterConfig::default_path);

        let persisted = match ConverterConfig::load_from(&config_path) {
            Ok(c) => c,
            Err(e) => {
                settings
                    .config_warnings
                    .push(format!("Ignoring persisted config: {}", e));
                ConverterConfig::default()
            }
        };

        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(f) = persisted.format {
                settings.format = f.to_string();
            }
        }
        if !is_arg_explicitly_set(&matches, "time_field") {
            if let Some(v) = persisted.time_field.clone() {
                settings.time_field = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "value_field") {
            if let Some(v) = persisted.value_field.clone() {
                settings.value_field = v;
            }
        }
        let timestamps_explicit =
            is_arg_explicitly_set(&matches, "utc") || is_arg_explicitly_set(&matches, "no_utc");
        if !timestamps_explicit {
            if let Some(mode) = persisted.timestamps {
                settings.utc = mode == TimestampMode::Utc;
            }
        }
        if settings.no_output_dir {
            settings.output_dir = None;
        } else if settings.output_dir.is_none() {
            settings.output_dir = persisted.output_dir.clone();
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        if settings.save_config {
            let config = ConverterConfig::from(&settings);
            if let Err(e) = config.save_to(&config_path) {
                settings.config_warnings.push(format!(
                    "Failed to save config to {}: {}",
                    config_path.display(),
                    e
                ));
            }
        }

        settings
    }

    /// Resolve the string-typed CLI values into [`ConvertOptions`].
    pub fn to_options(&self) -> Result<ConvertOptions> {
        if self.time_field.is_empty() || self.value_field.is_empty() {
            return Err(ConvertError::Config(
                "field names must not be empty".to_string(),
            ));
        }
        Ok(ConvertOptions {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            format: self.format.parse()?,
            fields: FieldNames {
                time: self.time_field.clone(),
                value: self.value_field.clone(),
            },
            timestamps: if self.utc {
                TimestampMode::Utc
            } else {
                TimestampMode::SourceLocal
            },
            recursive: self.recursive,
        })
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for ConverterConfig {
    fn from(s: &Settings) -> Self {
        ConverterConfig {
            format: s.format.parse().ok(),
            time_field: Some(s.time_field.clone()),
            value_field: Some(s.value_field.clone()),
            timestamps: Some(if s.utc {
                TimestampMode::Utc
            } else {
                TimestampMode::SourceLocal
            }),
            output_dir: s.output_dir.clone(),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
