// src/lib.rs

//! # Helicopter Rig Flight Core
//!
//! A `no_std`, no-alloc flight core for a single-main-rotor, single-tail-rotor
//! helicopter rig constrained to altitude and yaw. It holds the supervisory
//! flight state machine, a clamped PID loop per rotor, a ring-buffer altitude
//! average and a yaw tracker fed from encoder interrupts.
//!
//! Sensor drivers, PWM peripherals, the switch debouncer and the task
//! scheduler stay outside the crate. They are reached through the
//! [`AltitudeSource`], [`SwitchInput`] and [`RotorDrive`] traits, and the
//! encoder interrupt handlers call into a shared [`YawTracker`].
//!
//! Logging goes through `defmt` when the `defmt` feature is enabled and
//! compiles to nothing otherwise.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

#[macro_use]
mod fmt;

pub mod altitude;
pub mod config;
pub mod error;
pub mod flight;
pub mod pid;
pub mod yaw;

#[doc(inline)]
pub use altitude::{AltitudeSampler, SharedAltitude};
#[doc(inline)]
pub use config::{AxisGains, FlightConfig};
#[doc(inline)]
pub use error::{ConfigError, FlightError, FlightResult};
#[doc(inline)]
pub use flight::{
    AltitudeSource, FlightController, FlightMode, FlightState, PilotCommand, Rotor, RotorDrive,
    RotorDuty, SwitchEvent, SwitchInput,
};
#[doc(inline)]
pub use pid::PidController;
#[doc(inline)]
pub use yaw::{Direction, ReferenceMode, YawEvent, YawTracker};

#[cfg(test)]
mod test_utils;
