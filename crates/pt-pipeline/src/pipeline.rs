//! Pipeline composition: monitor → source → controller → reconciler → observer.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use pt_control::{Pid, PidConfig};
use pt_core::{Clock, Record, SystemClock};
use pt_monitor::ChangeMonitor;
use pt_source::{CsvSource, RecordSource};
use tracing::debug;

use crate::error::PipelineResult;
use crate::reconcile::reconcile;

/// Called with the full reconciled collection after every ingest cycle.
/// Invoked on the monitor's polling thread, at most once per batch, in batch
/// arrival order.
pub type SnapshotObserver = Arc<dyn Fn(&[Record]) + Send + Sync>;

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Controller tuning.
    pub pid: PidConfig,
    /// Poll interval for the change monitor.
    pub poll_interval: Duration,
    /// Re-ingest on every tick instead of gating on the modification time.
    pub ignore_modified_time: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pid: PidConfig::default(),
            poll_interval: Duration::from_millis(100),
            ignore_modified_time: true,
        }
    }
}

/// The per-batch ingest path, shared between the monitor thread (via the
/// batch handler) and direct callers.
struct Ingestor {
    controller: Mutex<Pid>,
    dataset: Mutex<Vec<Record>>,
    observer: SnapshotObserver,
}

impl Ingestor {
    fn ingest(&self, mut batch: Vec<Record>) {
        {
            let mut pid = lock_or_recover(&self.controller);
            // One controller, batch order: integral/derivative memory evolves
            // across the whole historical batch on every cycle.
            for record in &mut batch {
                record.output_value = pid.calculate(record.set_point, record.input_value);
            }
        }

        let snapshot = {
            let mut dataset = lock_or_recover(&self.dataset);
            reconcile(&mut dataset, &batch);
            dataset.clone()
        };

        debug!(
            "reconciled batch of {} into {} displayed records",
            batch.len(),
            snapshot.len()
        );
        (self.observer)(&snapshot);
    }
}

/// Owns the monitor, the controller, and the displayed collection.
///
/// One pipeline per watched file: the monitor's polling thread is the only
/// caller of the controller, so `calculate` is serialized by construction.
pub struct Pipeline {
    ingestor: Arc<Ingestor>,
    monitor: ChangeMonitor,
    poll_interval: Duration,
}

impl Pipeline {
    /// Pipeline over a CSV source driven by real time.
    pub fn new(config: PipelineConfig, observer: SnapshotObserver) -> Self {
        Self::with_parts(
            config,
            observer,
            Arc::new(CsvSource::new()),
            Arc::new(SystemClock::new()),
        )
    }

    /// Pipeline with explicit source and clock. Tests substitute a manual
    /// clock (and, if needed, a canned source) to get deterministic outputs.
    pub fn with_parts(
        config: PipelineConfig,
        observer: SnapshotObserver,
        source: Arc<dyn RecordSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ingestor = Arc::new(Ingestor {
            controller: Mutex::new(Pid::with_clock(config.pid, clock)),
            dataset: Mutex::new(Vec::new()),
            observer,
        });

        let handler_ingestor = Arc::clone(&ingestor);
        let monitor = ChangeMonitor::new(
            source,
            Box::new(move |batch| handler_ingestor.ingest(batch)),
        );
        monitor.set_ignore_modified_time(config.ignore_modified_time);

        Self {
            ingestor,
            monitor,
            poll_interval: config.poll_interval,
        }
    }

    /// Start watching `path`. The initial read happens synchronously; its
    /// errors propagate and leave the pipeline stopped.
    pub fn start(&mut self, path: &Path) -> PipelineResult<()> {
        self.monitor.start(path, self.poll_interval)?;
        Ok(())
    }

    /// Stop watching. After this returns no further snapshot is published.
    pub fn stop(&mut self) {
        self.monitor.stop();
    }

    pub fn is_running(&self) -> bool {
        self.monitor.is_running()
    }

    /// Run one batch through the controller and reconcile it into the
    /// displayed collection. This is the exact path the monitor drives for
    /// every published batch; it is public so batches can also be fed
    /// directly (one-shot ingestion, deterministic tests).
    pub fn ingest(&self, batch: Vec<Record>) {
        self.ingestor.ingest(batch);
    }

    /// Clone of the current displayed collection.
    pub fn snapshot(&self) -> Vec<Record> {
        lock_or_recover(&self.ingestor.dataset).clone()
    }

    /// Adjust controller tuning while running. The controller lock serializes
    /// this against the ingest path.
    pub fn tune(&self, adjust: impl FnOnce(&mut Pid)) {
        let mut pid = lock_or_recover(&self.ingestor.controller);
        adjust(&mut pid);
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
