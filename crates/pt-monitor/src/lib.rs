//! pt-monitor: file-change polling for pidtrend.
//!
//! A [`ChangeMonitor`] owns a polling thread that watches one file's
//! modification time and republishes the file's full contents as a batch
//! whenever it changes (or on every tick when forced). Batches are handed to
//! a caller-supplied handler on the polling thread, at most once per tick,
//! in tick order.

pub mod error;
pub mod monitor;

pub use error::{MonitorError, MonitorResult};
pub use monitor::{BatchHandler, ChangeMonitor};
