//! pt-pipeline: composition root for pidtrend.
//!
//! Wires the pieces together: the change monitor publishes raw batches, the
//! controller computes an output for every record in batch order, the
//! reconciler merges the batch into the displayed collection by timestamp
//! identity, and the observer is notified with the full reconciled snapshot.
//!
//! The whole historical batch is reprocessed through the one stateful
//! controller on every ingest cycle, so controller memory accumulates across
//! cycles. That is load-bearing behavior, not an accident; see the replay
//! integration test.

pub mod error;
pub mod pipeline;
pub mod reconcile;

pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, PipelineConfig, SnapshotObserver};
pub use reconcile::reconcile;
