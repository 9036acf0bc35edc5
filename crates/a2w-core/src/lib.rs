//! Shared types for the A2W export converter.
//!
//! Holds the domain model, the error type, timestamp parsing, CLI settings
//! and summary formatting. No file I/O happens here apart from the persisted
//! config file.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod timestamps;
