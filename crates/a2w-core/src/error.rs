use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`ConvertError`], used for the batch summary
/// and for deciding whether a failure is fatal to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file is not valid JSON or does not have the expected shape.
    Parse,
    /// A file could not be read, or an output could not be written.
    Io,
    /// The target directory is missing or unreadable. Fatal.
    Directory,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Parse => write!(f, "ParseError"),
            ErrorKind::Io => write!(f, "IOError"),
            ErrorKind::Directory => write!(f, "DirectoryError"),
        }
    }
}

/// All errors produced by the A2W converter.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The file content is not valid JSON.
    #[error("Failed to parse JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON document parsed but has no recognisable time-series array.
    #[error("Unexpected document shape in {path}: {reason}")]
    Shape { path: PathBuf, reason: String },

    /// A single time-series entry could not be turned into a record.
    #[error("Invalid entry #{index} in {path}: {reason}")]
    Record {
        path: PathBuf,
        index: usize,
        reason: String,
    },

    /// A source file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another source in the same batch already produced this output file.
    #[error("Output {output} was already written from {previous}; not overwriting it with {path}")]
    OutputCollision {
        path: PathBuf,
        output: PathBuf,
        previous: PathBuf,
    },

    /// The spreadsheet encoder rejected the data or failed to save.
    #[error("Failed to write spreadsheet {path}: {source}")]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The input or output directory does not exist or cannot be accessed.
    #[error("Directory not accessible {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConvertError {
    /// Classify this error into one of the three reportable kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::Json { .. } | ConvertError::Shape { .. } | ConvertError::Record { .. } => {
                ErrorKind::Parse
            }
            ConvertError::FileRead { .. }
            | ConvertError::FileWrite { .. }
            | ConvertError::OutputCollision { .. }
            | ConvertError::Spreadsheet { .. }
            | ConvertError::Config(_) => ErrorKind::Io,
            ConvertError::Directory { .. } => ErrorKind::Directory,
        }
    }

    /// `true` when the whole batch must stop.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Directory
    }
}

/// Convenience alias used throughout the converter crates.
pub type Result<T> = std::result::Result<T, ConvertError>;
