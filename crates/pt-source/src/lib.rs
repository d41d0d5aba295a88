//! pt-source: file ingestion for pidtrend.
//!
//! Converts a data file into an ordered batch of [`pt_core::Record`]s. The
//! only backend is CSV; spreadsheet extensions are recognized and rejected
//! so callers get a format error instead of a parse error.

pub mod csv;
pub mod error;

pub use csv::{CsvSource, RecordSource};
pub use error::{SourceError, SourceResult};
