//! The data unit flowing through the pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::numeric::Real;

/// One row of the ingested data source.
///
/// The timestamp is the record's identity: two records with equal timestamps
/// are the same logical entity across batches, even when their values differ.
/// `output_value` starts at zero and is written exactly once per ingest, by
/// the pipeline's controller pass, before the record reaches the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identity key, unique within one ingested batch.
    pub timestamp: NaiveDateTime,
    /// Measured process variable.
    pub input_value: Real,
    /// Desired target value.
    pub set_point: Real,
    /// Controller output, computed after ingest.
    pub output_value: Real,
}

impl Record {
    /// Create a record as the source reader produces it: output not yet computed.
    pub fn new(timestamp: NaiveDateTime, input_value: Real, set_point: Real) -> Self {
        Self {
            timestamp,
            input_value,
            set_point,
            output_value: 0.0,
        }
    }

    /// Identity comparison: same timestamp, regardless of values.
    pub fn same_identity(&self, other: &Record) -> bool {
        self.timestamp == other.timestamp
    }
}
