//! CSV reading.
//!
//! Expected layout: a header line, then `timestamp,input,setpoint` rows.
//! Row order is preserved; the reader never sorts. Rows with fewer than
//! three fields are skipped, matching the tolerant behavior consumers of
//! hand-edited files expect. `output_value` is always initialized to zero;
//! the controller pass fills it in after ingest.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use pt_core::{Real, Record};

use crate::error::{SourceError, SourceResult};

/// Timestamp layouts accepted in the first column. `%.f` tolerates an
/// optional fractional-second suffix.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A file-to-batch reader. The monitor re-reads through this on every
/// re-ingest, so implementations must be callable from the polling thread.
pub trait RecordSource: Send + Sync {
    fn read(&self, path: &Path) -> SourceResult<Vec<Record>>;
}

/// CSV-backed record source.
#[derive(Debug, Default, Clone)]
pub struct CsvSource;

impl CsvSource {
    pub fn new() -> Self {
        Self
    }
}

impl RecordSource for CsvSource {
    fn read(&self, path: &Path) -> SourceResult<Vec<Record>> {
        if !path.exists() {
            return Err(SourceError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if extension != "csv" {
            return Err(SourceError::UnsupportedFormat { extension });
        }

        let content = fs::read_to_string(path)?;
        parse_csv(&content)
    }
}

/// Parse CSV text into records. Separated from the file handling so the
/// grammar is testable without touching the filesystem.
pub(crate) fn parse_csv(content: &str) -> SourceResult<Vec<Record>> {
    let mut records = Vec::new();

    // Line numbers are 1-based; line 1 is the header.
    for (idx, line) in content.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 3 {
            // Short rows are ignored, not fatal.
            continue;
        }

        let line_no = idx + 1;
        let timestamp = parse_timestamp(fields[0].trim(), line_no)?;
        let input_value = parse_value(fields[1].trim(), "input value", line_no)?;
        let set_point = parse_value(fields[2].trim(), "set point", line_no)?;

        records.push(Record::new(timestamp, input_value, set_point));
    }

    Ok(records)
}

fn parse_timestamp(cell: &str, line: usize) -> SourceResult<NaiveDateTime> {
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(cell, format) {
            return Ok(ts);
        }
    }
    Err(SourceError::Parse {
        line,
        what: format!("unrecognized timestamp {cell:?}"),
    })
}

fn parse_value(cell: &str, what: &str, line: usize) -> SourceResult<Real> {
    cell.parse::<Real>().map_err(|_| SourceError::Parse {
        line,
        what: format!("invalid {what} {cell:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_rows() {
        let content = "timestamp,input,setpoint\n\
                       2024-01-01 00:00:00,10.0,50.0\n\
                       2024-01-01 00:00:01,20.0,50.0\n";
        let records = parse_csv(content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].input_value, 10.0);
        assert_eq!(records[0].set_point, 50.0);
        assert_eq!(records[0].output_value, 0.0);
        assert!(records[0].timestamp < records[1].timestamp);
    }

    #[test]
    fn accepts_iso_t_separator_and_fractional_seconds() {
        let content = "timestamp,input,setpoint\n\
                       2024-01-01T00:00:00.250,1.5,2.5\n";
        let records = parse_csv(content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].input_value, 1.5);
    }

    #[test]
    fn preserves_file_order() {
        // Out-of-order rows stay out of order; sorting is the reconciler's job.
        let content = "timestamp,input,setpoint\n\
                       2024-01-01 00:00:05,5.0,50.0\n\
                       2024-01-01 00:00:01,1.0,50.0\n";
        let records = parse_csv(content).unwrap();
        assert!(records[0].timestamp > records[1].timestamp);
    }

    #[test]
    fn skips_short_and_empty_rows() {
        let content = "timestamp,input,setpoint\n\
                       \n\
                       2024-01-01 00:00:00,10.0\n\
                       2024-01-01 00:00:01,20.0,50.0\n";
        let records = parse_csv(content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].input_value, 20.0);
    }

    #[test]
    fn malformed_timestamp_reports_line_number() {
        let content = "timestamp,input,setpoint\n\
                       2024-01-01 00:00:00,10.0,50.0\n\
                       not-a-time,20.0,50.0\n";
        let err = parse_csv(content).unwrap_err();
        match err {
            SourceError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_number_is_a_parse_error() {
        let content = "timestamp,input,setpoint\n\
                       2024-01-01 00:00:00,abc,50.0\n";
        assert!(matches!(
            parse_csv(content),
            Err(SourceError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn empty_body_yields_empty_batch() {
        let records = parse_csv("timestamp,input,setpoint\n").unwrap();
        assert!(records.is_empty());
    }
}
