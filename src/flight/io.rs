// src/flight/io.rs

//! Interfaces to the collaborators outside the flight core: the altitude
//! sample source, the flight switch and the rotor PWM outputs.

/// Source of the averaged raw altitude reading.
pub trait AltitudeSource {
    /// Latest average, or `None` when no valid reading is available.
    fn average(&self) -> Option<u16>;
}

/// Debounced flight switch.
pub trait SwitchInput {
    /// Returns the switch transition since the last poll.
    fn poll(&mut self) -> SwitchEvent;
}

/// Rotor PWM outputs.
pub trait RotorDrive {
    /// Sets the duty cycle, in percent, of one rotor at the given carrier frequency.
    fn set_duty(&mut self, rotor: Rotor, frequency_hz: u32, duty: u16);
}

/// Flight switch transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchEvent {
    /// Switch moved to the flight position.
    Pushed,
    /// Switch moved to the landing position.
    Released,
    /// No transition since the last poll.
    #[default]
    Unchanged,
}

/// One of the two actuated rotors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotor {
    /// Main rotor, drives altitude.
    Main,
    /// Tail rotor, drives yaw.
    Tail,
}
