//! Polling monitor implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use pt_core::Record;
use pt_source::RecordSource;
use tracing::{debug, warn};

use crate::error::MonitorResult;

/// Receives each published batch on the polling thread.
pub type BatchHandler = Box<dyn FnMut(Vec<Record>) + Send>;

/// Watches one file by polling its modification time.
///
/// `start` performs a synchronous read and publishes the first batch before
/// the polling thread is armed, so a consumer sees data without waiting for
/// the first interval. Subsequent ticks re-ingest the whole file when the
/// modification time is strictly newer than the last successful read, or on
/// every tick when the force flag is set.
///
/// `start` and `stop` may be called from any thread. `stop` joins the
/// polling thread: after it returns no further batch is published, though an
/// in-flight tick is allowed to finish first.
pub struct ChangeMonitor {
    source: Arc<dyn RecordSource>,
    handler: Arc<Mutex<BatchHandler>>,
    ignore_modified_time: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ChangeMonitor {
    pub fn new(source: Arc<dyn RecordSource>, handler: BatchHandler) -> Self {
        Self {
            source,
            handler: Arc::new(Mutex::new(handler)),
            ignore_modified_time: Arc::new(AtomicBool::new(false)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Re-ingest on every tick regardless of the modification time.
    pub fn set_ignore_modified_time(&self, ignore: bool) {
        self.ignore_modified_time.store(ignore, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Begin monitoring `path`, replacing any monitoring already in progress.
    ///
    /// Reads the file once synchronously and publishes that batch before the
    /// polling thread starts. Errors from this initial read (missing file,
    /// unsupported format, malformed rows) propagate and leave the monitor
    /// stopped; once running, the same failures are logged and retried.
    pub fn start(&mut self, path: &Path, interval: Duration) -> MonitorResult<()> {
        self.stop();

        let mut last_modified = modified_time(path)?;
        let batch = self.source.read(path)?;
        publish(&self.handler, batch);

        self.stop_flag.store(false, Ordering::SeqCst);

        let source = Arc::clone(&self.source);
        let handler = Arc::clone(&self.handler);
        let ignore = Arc::clone(&self.ignore_modified_time);
        let stop_flag = Arc::clone(&self.stop_flag);
        let path: PathBuf = path.to_path_buf();

        self.worker = Some(thread::spawn(move || {
            loop {
                thread::sleep(interval);
                if stop_flag.load(Ordering::SeqCst) {
                    break;
                }

                let current = match modified_time(&path) {
                    Ok(t) => t,
                    Err(err) => {
                        warn!("failed to stat {}: {err}", path.display());
                        continue;
                    }
                };

                let force = ignore.load(Ordering::Relaxed);
                if !force && current <= last_modified {
                    continue;
                }

                match source.read(&path) {
                    Ok(batch) => {
                        // Recorded only on success so a transient read
                        // failure is retried on the next tick.
                        last_modified = current;
                        debug!("re-ingested {} ({} records)", path.display(), batch.len());
                        publish(&handler, batch);
                    }
                    Err(err) => {
                        warn!("failed to re-ingest {}: {err}", path.display());
                    }
                }
            }
        }));

        Ok(())
    }

    /// Stop monitoring. Safe to call when not running.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("monitor thread panicked");
        }
    }
}

impl Drop for ChangeMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

fn publish(handler: &Mutex<BatchHandler>, batch: Vec<Record>) {
    match handler.lock() {
        Ok(mut handler) => handler(batch),
        Err(_) => warn!("batch handler poisoned; dropping batch"),
    }
}
