//! Batch runtime for the A2W export converter.
//!
//! Drives discovery, per-file conversion and failure collection on top of the
//! data layer.

pub mod batch;

pub use a2w_core as core;
pub use a2w_data as data;
