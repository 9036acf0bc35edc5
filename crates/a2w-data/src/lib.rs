//! Data layer for the A2W export converter.
//!
//! Responsible for discovering JSON exports, extracting their time-series
//! records, writing the spreadsheets and summarising each series.

pub mod analysis;
pub mod reader;
pub mod writer;

pub use a2w_core as core;
