// src/pid/axis.rs

//! # Clamped-Term PID Compute Module
//!
//! This module provides the compute callback and control data used by every
//! rotor loop. Each of the three terms is scaled by its gain and clamped to
//! its own limit inside the callback, so the inner `piddiy` controller runs
//! with unity gains and simply sums the terms it is handed.

use crate::config::AxisGains;
use piddiy::PidController;

/// Control data for one clamped-term PID update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisControlData {
    /// Error for this tick, target minus measurement.
    pub error: f32,
    /// Error from the previous accepted update.
    pub previous_error: f32,
    /// The time delta since the last computation. Must be positive.
    pub dt: f32,
    /// Gains and clamp limits for the axis.
    pub gains: AxisGains,
}

/// Clamped-term compute callback.
///
/// Returns the proportional term, the integral accumulator and the
/// derivative term, each already multiplied by its gain and clamped. The
/// accumulator is the value `piddiy` stores back as its integral, so the
/// anti-windup bound holds across calls.
pub fn compute_axis(
    pid: &mut PidController<f32, AxisControlData>,
    data: AxisControlData,
) -> (f32, f32, f32) {
    let gains = data.gains;
    let proportional = (gains.kp * data.error).clamp(-gains.kp_limit, gains.kp_limit);
    let integral =
        (pid.integral + gains.ki * data.error * data.dt).clamp(-gains.ki_limit, gains.ki_limit);
    let derivative = (gains.kd * (data.error - data.previous_error) / data.dt)
        .clamp(-gains.kd_limit, gains.kd_limit);

    (proportional, integral, derivative)
}
