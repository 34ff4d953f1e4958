// src/flight/state.rs

//! Flight modes, the flight state record and the discrete pilot commands.

use crate::error::FlightError;

/// Supervisory flight mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FlightMode {
    /// On the ground, rotors off, recalibrating the ground reference.
    #[default]
    Landed = 0,
    /// Sweeping yaw slowly until the reference mark is seen.
    FindReference = 1,
    /// Tracking the altitude and yaw targets.
    Flying = 2,
    /// Returning to the reference heading and descending.
    Landing = 3,
}

impl TryFrom<u8> for FlightMode {
    type Error = FlightError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(FlightMode::Landed),
            1 => Ok(FlightMode::FindReference),
            2 => Ok(FlightMode::Flying),
            3 => Ok(FlightMode::Landing),
            _ => Err(FlightError::UnknownMode(raw)),
        }
    }
}

impl From<FlightMode> for u8 {
    fn from(mode: FlightMode) -> Self {
        mode as u8
    }
}

/// Everything the state machine knows about the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlightState {
    /// Current mode.
    pub mode: FlightMode,
    /// Raw altitude reading captured on the ground.
    pub ground_reference: u16,
    /// Height above the ground reference, in percent of the calibration span.
    pub current_altitude_percent: i16,
    /// Altitude target, always within the configured bounds.
    pub target_altitude_percent: i16,
    /// Yaw position seen on the last tick, in slots.
    pub current_yaw: i32,
    /// Yaw target, in slots.
    pub target_yaw: i32,
}

/// Duty cycles last written to the rotors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotorDuty {
    /// Main rotor duty, percent.
    pub main: u16,
    /// Tail rotor duty, percent.
    pub tail: u16,
}

/// Discrete target adjustment from the pilot interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PilotCommand {
    /// Raise the altitude target one step.
    HeightUp,
    /// Lower the altitude target one step.
    HeightDown,
    /// Turn the yaw target one step counter-clockwise.
    YawLeft,
    /// Turn the yaw target one step clockwise.
    YawRight,
    /// Turn the yaw target half a revolution.
    SpinHalfTurn,
    /// Load the mid-flight altitude target.
    MidFlight,
}
