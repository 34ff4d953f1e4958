// src/test_utils.rs

//! This module contains utilities for testing.

use core::cell::Cell;
use std::collections::VecDeque;

use crate::flight::{AltitudeSource, Rotor, RotorDrive, SwitchEvent, SwitchInput};

/// A constant defining the tolerance within which floating-point values
/// are considered close enough to be equal.
pub const TEST_TOLERANCE: f32 = 1e-5;

/// Checks if two floating point numbers are close enough to be considered
/// equal.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` is less than
/// `TEST_TOLERANCE`, otherwise `false`.
pub fn value_close(target: f32, value: f32) -> bool {
    (target - value).abs() < TEST_TOLERANCE
}

/// Altitude source whose reading is set by the test.
#[derive(Default)]
pub struct FixedAltitude {
    reading: Cell<Option<u16>>,
}

impl FixedAltitude {
    /// Creates a source reporting `reading`.
    pub fn new(reading: Option<u16>) -> Self {
        Self {
            reading: Cell::new(reading),
        }
    }

    /// Changes the reported reading.
    pub fn set(&self, reading: Option<u16>) {
        self.reading.set(reading);
    }
}

impl AltitudeSource for FixedAltitude {
    fn average(&self) -> Option<u16> {
        self.reading.get()
    }
}

/// Switch that replays queued events, then reports `Unchanged`.
#[derive(Default)]
pub struct ScriptedSwitch {
    events: VecDeque<SwitchEvent>,
}

impl ScriptedSwitch {
    /// Queues an event for a later poll.
    pub fn push(&mut self, event: SwitchEvent) {
        self.events.push_back(event);
    }
}

impl SwitchInput for ScriptedSwitch {
    fn poll(&mut self) -> SwitchEvent {
        self.events.pop_front().unwrap_or(SwitchEvent::Unchanged)
    }
}

/// Rotor output that records every command.
#[derive(Default)]
pub struct RecordingRotors {
    /// Every `(rotor, frequency, duty)` written so far.
    pub commands: Vec<(Rotor, u32, u16)>,
}

impl RecordingRotors {
    /// Duty of the most recent command for `rotor`.
    pub fn last(&self, rotor: Rotor) -> Option<u16> {
        self.commands
            .iter()
            .rev()
            .find(|(r, _, _)| *r == rotor)
            .map(|(_, _, duty)| *duty)
    }
}

impl RotorDrive for RecordingRotors {
    fn set_duty(&mut self, rotor: Rotor, frequency_hz: u32, duty: u16) {
        self.commands.push((rotor, frequency_hz, duty));
    }
}
