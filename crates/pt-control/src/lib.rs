//! Closed-loop PID control for pidtrend.
//!
//! One [`Pid`] instance per pipeline. The controller is deliberately
//! stateful: integral and derivative memory carry across every record of
//! every ingested batch, so reprocessing a file grows the integral term with
//! each pass. Elapsed time between calls comes from an injectable clock.

pub mod controller;

pub use controller::{Pid, PidConfig};
