// src/pid/controller.rs

//! # Rotor PID Controller
//!
//! One [`PidController`] drives each rotor. An update takes the current error
//! and the time step and returns a duty cycle in percent, bounded to
//! `0..=max_duty`. A non-positive or non-finite time step, or a non-finite
//! error, is rejected by returning the previously held output unchanged.

use crate::config::AxisGains;
use crate::pid::{compute_axis, AxisControlData};
use num_traits::float::FloatCore;
use piddiy::PidController as PidCore;

/// Stateful PID controller for a single rotor.
pub struct PidController {
    core: PidCore<f32, AxisControlData>,
    gains: AxisGains,
    previous_error: f32,
    output: u16,
}

impl PidController {
    /// Creates a controller with the given gains and limits.
    ///
    /// Negative limits are taken by magnitude and non-finite limits are
    /// treated as zero.
    pub fn new(gains: AxisGains) -> Self {
        let mut core = PidCore::new();
        core.compute_fn(compute_axis)
            .set_point(0.0)
            .kp(1.0)
            .ki(1.0)
            .kd(1.0);

        let gains = AxisGains {
            kp_limit: sanitize_limit(gains.kp_limit),
            ki_limit: sanitize_limit(gains.ki_limit),
            kd_limit: sanitize_limit(gains.kd_limit),
            ..gains
        };

        PidController {
            core,
            gains,
            previous_error: 0.0,
            output: 0,
        }
    }

    /// Runs one update and returns the duty cycle to command.
    pub fn update(&mut self, error: f32, dt: f32) -> u16 {
        if !(dt > 0.0) || !dt.is_finite() || !error.is_finite() {
            return self.output;
        }

        let data = AxisControlData {
            error,
            previous_error: self.previous_error,
            dt,
            gains: self.gains,
        };
        let sum = self.core.compute(data);
        self.previous_error = error;

        let max_duty = f32::from(self.gains.max_duty);
        let bounded = if sum.is_nan() {
            0.0
        } else {
            sum.clamp(0.0, max_duty)
        };
        self.output = FloatCore::round(bounded) as u16;
        self.output
    }

    /// Clears the integral accumulator, the previous error and the held output.
    pub fn reset(&mut self) {
        self.core.integral = 0.0;
        self.core.error = 0.0;
        self.previous_error = 0.0;
        self.output = 0;
    }

    /// Output of the last accepted update.
    pub fn output(&self) -> u16 {
        self.output
    }

    /// Current integral accumulator, already scaled by the integral gain.
    pub fn integral(&self) -> f32 {
        self.core.integral
    }

    /// Error seen by the last accepted update.
    pub fn previous_error(&self) -> f32 {
        self.previous_error
    }

    /// Gains and limits in use.
    pub fn gains(&self) -> &AxisGains {
        &self.gains
    }
}

fn sanitize_limit(limit: f32) -> f32 {
    if limit.is_finite() {
        FloatCore::abs(limit)
    } else {
        0.0
    }
}
