//! PID controller implementation.
//!
//! Standard parallel form:
//! u(t) = Kp * e(t) + Ki * ∫e(t)dt + Kd * de(t)/dt
//!
//! with the output clamped to `[min_output, max_output]`. Elapsed time is
//! measured internally between `calculate` calls through a [`Clock`], so the
//! output is wall-clock dependent unless a manual clock is injected.

use std::sync::Arc;
use std::time::Duration;

use pt_core::{Clock, Real, SystemClock};
use serde::{Deserialize, Serialize};

/// Controller tuning: gains and output clamp bounds.
///
/// Bounds are trusted as `min_output <= max_output`; they are not validated.
/// An inverted pair produces a well-defined but unspecified clamped value
/// rather than a panic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    /// Proportional gain.
    pub kp: Real,
    /// Integral gain.
    pub ki: Real,
    /// Derivative gain.
    pub kd: Real,
    /// Minimum output value.
    pub min_output: Real,
    /// Maximum output value.
    pub max_output: Real,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 0.3,
            ki: 0.005,
            kd: 0.05,
            min_output: 0.0,
            max_output: 100.0,
        }
    }
}

/// A stateful PID controller.
///
/// Holds the accumulated integral, the previous error, and the time of the
/// last invocation. Construction seeds the invocation time, so the first
/// `calculate` measures elapsed time from construction (or from the last
/// [`Pid::reset`]).
pub struct Pid {
    config: PidConfig,
    integral: Real,
    prev_error: Option<Real>,
    last_tick: Duration,
    clock: Arc<dyn Clock>,
}

impl Pid {
    /// Create a controller driven by real time.
    pub fn new(config: PidConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create a controller with an explicit time source. Tests inject a
    /// manual clock here to make elapsed time deterministic.
    pub fn with_clock(config: PidConfig, clock: Arc<dyn Clock>) -> Self {
        let last_tick = clock.now();
        Self {
            config,
            integral: 0.0,
            prev_error: None,
            last_tick,
            clock,
        }
    }

    /// Compute one clamped control output for a (setpoint, measurement) pair.
    ///
    /// Side effects: advances the invocation clock, accumulates the integral,
    /// and stores the error for the next derivative. The first call after
    /// construction or [`Pid::reset`] has no prior error and contributes no
    /// derivative term; the same holds for any call with zero elapsed time
    /// (calls faster than clock resolution), so the output is always finite
    /// for finite inputs.
    pub fn calculate(&mut self, set_point: Real, measurement: Real) -> Real {
        let now = self.clock.now();
        let elapsed = now.saturating_sub(self.last_tick).as_secs_f64();
        self.last_tick = now;

        let error = set_point - measurement;

        self.integral += error * elapsed;

        let derivative = match self.prev_error {
            Some(prev) if elapsed > 0.0 => (error - prev) / elapsed,
            _ => 0.0,
        };
        self.prev_error = Some(error);

        let raw = self.config.kp * error + self.config.ki * self.integral + self.config.kd * derivative;
        // min-then-max instead of f64::clamp: inverted bounds stay non-panicking.
        raw.min(self.config.max_output).max(self.config.min_output)
    }

    /// Clear integral and derivative memory and re-seed the invocation time.
    /// Gains and clamp bounds are untouched.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.last_tick = self.clock.now();
    }

    /// Set the proportional gain.
    pub fn set_kp(&mut self, kp: Real) {
        self.config.kp = kp;
    }

    /// Set the integral gain.
    pub fn set_ki(&mut self, ki: Real) {
        self.config.ki = ki;
    }

    /// Set the derivative gain.
    pub fn set_kd(&mut self, kd: Real) {
        self.config.kd = kd;
    }

    /// Set the output clamp bounds. Trusted as `min <= max`.
    pub fn set_output_limits(&mut self, min: Real, max: Real) {
        self.config.min_output = min;
        self.config.max_output = max;
    }

    /// Current tuning.
    pub fn config(&self) -> PidConfig {
        self.config
    }

    /// Accumulated integral term.
    pub fn integral(&self) -> Real {
        self.integral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_core::{ManualClock, approx_eq};

    fn manual_pid(config: PidConfig) -> (Pid, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let pid = Pid::with_clock(config, clock.clone());
        (pid, clock)
    }

    fn trend_config() -> PidConfig {
        PidConfig {
            kp: 0.3,
            ki: 0.005,
            kd: 0.05,
            min_output: 0.0,
            max_output: 100.0,
        }
    }

    #[test]
    fn first_call_has_no_derivative_term() {
        // Kp=0.3, Ki=0.005, Kd=0.05, clamp [0,100], dt = 1 s.
        // error = 40: P = 12, I = 0.005 * 40 * 1 = 0.2, D = 0 (first call).
        let (mut pid, clock) = manual_pid(trend_config());
        clock.advance(Duration::from_secs(1));
        let out = pid.calculate(50.0, 10.0);
        assert!(approx_eq(out, 12.2, 1e-9), "got {out}");
    }

    #[test]
    fn second_call_uses_integral_and_derivative() {
        let (mut pid, clock) = manual_pid(trend_config());
        clock.advance(Duration::from_secs(1));
        let first = pid.calculate(50.0, 10.0);
        assert!(approx_eq(first, 12.2, 1e-9));

        clock.advance(Duration::from_secs(1));
        // error = 30: integral = 40 + 30 = 70, derivative = (30 - 40) / 1 = -10.
        // P = 9, I = 0.35, D = -0.5 -> 8.85
        let second = pid.calculate(50.0, 20.0);
        assert!(approx_eq(second, 8.85, 1e-9), "got {second}");
    }

    #[test]
    fn zero_elapsed_time_yields_finite_output() {
        let (mut pid, clock) = manual_pid(trend_config());
        clock.advance(Duration::from_secs(1));
        let _ = pid.calculate(50.0, 10.0);

        // Clock not advanced: elapsed = 0. Division by elapsed would be NaN;
        // the derivative contribution must be zero instead.
        let out = pid.calculate(50.0, 20.0);
        assert!(out.is_finite());
        // P = 9, integral unchanged at 40 -> I = 0.2, D = 0.
        assert!(approx_eq(out, 9.2, 1e-9), "got {out}");
    }

    #[test]
    fn output_is_clamped_to_bounds() {
        let (mut pid, clock) = manual_pid(PidConfig {
            kp: 100.0,
            ki: 0.0,
            kd: 0.0,
            min_output: -5.0,
            max_output: 5.0,
        });
        clock.advance(Duration::from_secs(1));
        assert_eq!(pid.calculate(1000.0, 0.0), 5.0);
        clock.advance(Duration::from_secs(1));
        assert_eq!(pid.calculate(-1000.0, 0.0), -5.0);
    }

    #[test]
    fn reset_behaves_like_fresh_controller() {
        let (mut pid, clock) = manual_pid(trend_config());

        clock.advance(Duration::from_secs(1));
        let fresh = pid.calculate(50.0, 10.0);

        // Pollute the controller memory.
        clock.advance(Duration::from_secs(3));
        let _ = pid.calculate(80.0, 5.0);
        clock.advance(Duration::from_secs(2));
        let _ = pid.calculate(-10.0, 30.0);

        pid.reset();
        clock.advance(Duration::from_secs(1));
        let after_reset = pid.calculate(50.0, 10.0);
        assert!(approx_eq(after_reset, fresh, 1e-9));
    }

    #[test]
    fn reset_preserves_tuning() {
        let (mut pid, clock) = manual_pid(trend_config());
        pid.set_kp(1.5);
        pid.set_ki(0.2);
        pid.set_kd(0.0);
        pid.set_output_limits(-1.0, 1.0);
        clock.advance(Duration::from_secs(1));
        let _ = pid.calculate(10.0, 0.0);

        pid.reset();
        let config = pid.config();
        assert_eq!(config.kp, 1.5);
        assert_eq!(config.ki, 0.2);
        assert_eq!(config.kd, 0.0);
        assert_eq!(config.min_output, -1.0);
        assert_eq!(config.max_output, 1.0);
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn gains_are_mutable_between_calls() {
        let (mut pid, clock) = manual_pid(PidConfig {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            min_output: -100.0,
            max_output: 100.0,
        });
        clock.advance(Duration::from_secs(1));
        assert!(approx_eq(pid.calculate(10.0, 0.0), 10.0, 1e-9));

        pid.set_kp(2.0);
        clock.advance(Duration::from_secs(1));
        assert!(approx_eq(pid.calculate(10.0, 0.0), 20.0, 1e-9));
    }

    #[test]
    fn integral_accumulates_over_replayed_input() {
        // Feeding the same pair repeatedly keeps growing the integral term;
        // this is what makes whole-file reprocessing cumulative.
        let (mut pid, clock) = manual_pid(trend_config());
        let mut last = f64::NEG_INFINITY;
        for _ in 0..5 {
            clock.advance(Duration::from_secs(1));
            let out = pid.calculate(50.0, 10.0);
            assert!(out > last);
            last = out;
        }
        assert!(approx_eq(pid.integral(), 200.0, 1e-9));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use pt_core::ManualClock;

    proptest! {
        #[test]
        fn output_stays_within_bounds(
            pairs in prop::collection::vec((-1e6_f64..1e6, -1e6_f64..1e6), 1..50),
            dt_ms in prop::collection::vec(0_u64..5_000, 1..50),
        ) {
            let clock = Arc::new(ManualClock::new());
            let mut pid = Pid::with_clock(
                PidConfig {
                    kp: 0.3,
                    ki: 0.005,
                    kd: 0.05,
                    min_output: 0.0,
                    max_output: 100.0,
                },
                clock.clone(),
            );
            for (i, (sp, pv)) in pairs.iter().enumerate() {
                clock.advance(Duration::from_millis(dt_ms[i % dt_ms.len()]));
                let out = pid.calculate(*sp, *pv);
                prop_assert!((0.0..=100.0).contains(&out), "out of range: {out}");
            }
        }
    }
}
