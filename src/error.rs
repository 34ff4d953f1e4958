// src/error.rs

//! Error types for configuration validation and flight-mode handling.
//!
//! Nothing in the control path returns an error: sensor loss holds the last
//! output and out-of-range targets are clamped. Errors are reserved for a
//! configuration that fails validation at startup and for a raw mode value
//! the state machine does not recognise.

use thiserror::Error;

/// Rejected configuration values.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A PID gain or clamp limit is negative or not finite.
    #[error("PID gain or limit for the {0} axis is negative or not finite")]
    InvalidGain(&'static str),

    /// The actuator duty ceiling is zero or above 100 %.
    #[error("maximum duty for the {0} axis must be within 1..=100")]
    InvalidDuty(&'static str),

    /// The control tick period is zero.
    #[error("control tick period must be non-zero")]
    InvalidTickPeriod,

    /// Slots per revolution must be even and at least two.
    #[error("slots per revolution must be an even number of at least 2")]
    InvalidSlotsPerRevolution,

    /// The altitude calibration span is zero, negative or not finite.
    #[error("altitude calibration span must be positive")]
    InvalidCalibrationSpan,

    /// Altitude bounds are inverted or outside 0..=100 %.
    #[error("altitude bounds must satisfy 0 <= min <= max <= 100")]
    InvalidAltitudeBounds,

    /// A hover, find-reference or mid-flight altitude lies outside the bounds.
    #[error("preset altitude {0} lies outside the configured bounds")]
    PresetOutOfBounds(&'static str),

    /// A per-tick step is zero or negative.
    #[error("{0} step must be positive")]
    InvalidStep(&'static str),

    /// The maximum rotation count before the yaw counter is rebased is zero.
    #[error("maximum absolute rotations must be non-zero")]
    InvalidMaxRotations,
}

/// Flight-core error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlightError {
    /// Configuration was rejected at startup.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A raw mode value does not name any flight mode. Actuation is halted.
    #[error("unknown flight mode {0}")]
    UnknownMode(u8),
}

/// Result alias for the flight core.
pub type FlightResult<T> = Result<T, FlightError>;
