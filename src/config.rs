// src/config.rs

//! # Flight Core Configuration
//!
//! All tuning constants for the rig live here: PID gains and clamp limits per
//! rotor, target step sizes, the encoder geometry, PWM carrier frequency,
//! control tick period and the altitude calibration span. The values are
//! compile-time defaults collected in [`FlightConfig::DEFAULT`] and checked
//! once by [`FlightConfig::validate`] before the controller is built.

use crate::error::ConfigError;

/// PID gains, per-term clamp limits and the duty ceiling for one rotor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisGains {
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain.
    pub ki: f32,
    /// Derivative gain.
    pub kd: f32,
    /// Magnitude limit for the proportional term.
    pub kp_limit: f32,
    /// Magnitude limit for the integral accumulator (anti-windup).
    pub ki_limit: f32,
    /// Magnitude limit for the derivative term.
    pub kd_limit: f32,
    /// Largest duty cycle, in percent, the rotor may be commanded to.
    pub max_duty: u16,
}

impl AxisGains {
    /// Main rotor defaults.
    pub const MAIN: Self = Self {
        kp: 0.8,
        ki: 1.5,
        kd: 0.05,
        kp_limit: 60.0,
        ki_limit: 60.0,
        kd_limit: 20.0,
        max_duty: 98,
    };

    /// Tail rotor defaults.
    pub const TAIL: Self = Self {
        kp: 0.5,
        ki: 0.8,
        kd: 0.02,
        kp_limit: 50.0,
        ki_limit: 40.0,
        kd_limit: 20.0,
        max_duty: 98,
    };

    fn validate(&self, axis: &'static str) -> Result<(), ConfigError> {
        let terms = [
            self.kp,
            self.ki,
            self.kd,
            self.kp_limit,
            self.ki_limit,
            self.kd_limit,
        ];
        if terms.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::InvalidGain(axis));
        }
        if self.max_duty == 0 || self.max_duty > 100 {
            return Err(ConfigError::InvalidDuty(axis));
        }
        Ok(())
    }
}

/// Configuration for the whole flight core.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlightConfig {
    /// Main rotor (altitude) loop.
    pub main: AxisGains,
    /// Tail rotor (yaw) loop.
    pub tail: AxisGains,
    /// PWM carrier frequency passed with every duty command.
    pub pwm_frequency_hz: u32,
    /// Period of the control tick.
    pub tick_period_ms: u32,
    /// Encoder slots in one full revolution.
    pub slots_per_rev: i32,
    /// Revolutions in either direction before the yaw counter is rebased to zero.
    pub max_rotations: i32,
    /// Drop in raw altitude reading, in ADC counts, between ground and 100 % height.
    pub altitude_span: f32,
    /// Lowest altitude target, in percent.
    pub min_altitude: i16,
    /// Highest altitude target, in percent.
    pub max_altitude: i16,
    /// Altitude change for one height increment or decrement.
    pub height_step: i16,
    /// Yaw change, in slots, for one angle increment or decrement.
    pub yaw_step: i32,
    /// Altitude target loaded while landed, used once flying begins.
    pub hover_altitude: i16,
    /// Altitude held while sweeping for the reference mark.
    pub find_reference_altitude: i16,
    /// Altitude loaded by the mid-flight adjustment command.
    pub mid_flight_altitude: i16,
    /// Slots the yaw target advances each tick while sweeping.
    pub sweep_step: i32,
    /// Yaw error, in slots, below which the landing descent proceeds.
    pub landing_yaw_tolerance: i32,
    /// Altitude target decrement per tick while landing.
    pub landing_step: i16,
    /// Altitude at or below which landing completes.
    pub landing_floor: i16,
    /// Below this altitude the descent continues regardless of yaw error.
    pub final_descent_altitude: i16,
}

impl FlightConfig {
    /// Rig defaults.
    pub const DEFAULT: Self = Self {
        main: AxisGains::MAIN,
        tail: AxisGains::TAIL,
        pwm_frequency_hz: 250,
        tick_period_ms: 10,
        slots_per_rev: 448,
        max_rotations: 10,
        // 1 V of the 3.3 V, 12-bit ADC range.
        altitude_span: 1241.0,
        min_altitude: 0,
        max_altitude: 100,
        height_step: 10,
        yaw_step: 19,
        hover_altitude: 10,
        find_reference_altitude: 10,
        mid_flight_altitude: 50,
        sweep_step: 1,
        landing_yaw_tolerance: 7,
        landing_step: 1,
        landing_floor: 2,
        final_descent_altitude: 10,
    };

    /// Creates a configuration holding the rig defaults.
    ///
    /// Example Usage
    /// ```
    /// use heli_flight_core::FlightConfig;
    ///
    /// let mut config = FlightConfig::new();
    /// config.main.kp = 1.2;
    /// config.height_step = 5;
    /// assert!(config.validate().is_ok());
    /// ```
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Control tick period in seconds, used as the PID time step.
    pub fn dt(&self) -> f32 {
        self.tick_period_ms as f32 / 1000.0
    }

    /// Checks every value the control law depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.main.validate("main")?;
        self.tail.validate("tail")?;

        if self.tick_period_ms == 0 {
            return Err(ConfigError::InvalidTickPeriod);
        }
        if self.slots_per_rev < 2 || self.slots_per_rev % 2 != 0 {
            return Err(ConfigError::InvalidSlotsPerRevolution);
        }
        if self.max_rotations <= 0 {
            return Err(ConfigError::InvalidMaxRotations);
        }
        if !self.altitude_span.is_finite() || self.altitude_span <= 0.0 {
            return Err(ConfigError::InvalidCalibrationSpan);
        }
        if self.min_altitude < 0
            || self.max_altitude > 100
            || self.min_altitude > self.max_altitude
        {
            return Err(ConfigError::InvalidAltitudeBounds);
        }

        let presets = [
            ("hover", self.hover_altitude),
            ("find-reference", self.find_reference_altitude),
            ("mid-flight", self.mid_flight_altitude),
            // Landing ends on the target, so it must be reachable.
            ("landing-floor", self.landing_floor),
        ];
        for (name, altitude) in presets {
            if !self.altitude_in_bounds(altitude) {
                return Err(ConfigError::PresetOutOfBounds(name));
            }
        }

        if self.height_step <= 0 {
            return Err(ConfigError::InvalidStep("height"));
        }
        if self.yaw_step <= 0 {
            return Err(ConfigError::InvalidStep("yaw"));
        }
        if self.sweep_step <= 0 {
            return Err(ConfigError::InvalidStep("sweep"));
        }
        if self.landing_step <= 0 {
            return Err(ConfigError::InvalidStep("landing"));
        }
        Ok(())
    }

    /// Clamps an altitude target into the configured bounds.
    pub fn clamp_altitude(&self, altitude: i16) -> i16 {
        altitude.clamp(self.min_altitude, self.max_altitude)
    }

    /// Largest yaw target magnitude, in slots.
    pub fn yaw_limit(&self) -> i32 {
        self.slots_per_rev.saturating_mul(self.max_rotations)
    }

    fn altitude_in_bounds(&self, altitude: i16) -> bool {
        (self.min_altitude..=self.max_altitude).contains(&altitude)
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the shipped defaults pass validation.
    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(Ok(()), FlightConfig::DEFAULT.validate());
        assert_eq!(FlightConfig::new(), FlightConfig::default());
    }

    /// Test that negative or non-finite gains are rejected per axis.
    #[test]
    fn test_rejects_bad_gains() {
        let mut config = FlightConfig::new();
        config.tail.ki = -0.1;
        assert_eq!(Err(ConfigError::InvalidGain("tail")), config.validate());

        let mut config = FlightConfig::new();
        config.main.kd_limit = f32::NAN;
        assert_eq!(Err(ConfigError::InvalidGain("main")), config.validate());
    }

    /// Test that a duty ceiling outside 1..=100 is rejected.
    #[test]
    fn test_rejects_bad_duty() {
        let mut config = FlightConfig::new();
        config.main.max_duty = 0;
        assert_eq!(Err(ConfigError::InvalidDuty("main")), config.validate());

        config.main.max_duty = 101;
        assert_eq!(Err(ConfigError::InvalidDuty("main")), config.validate());
    }

    /// Test rejection of encoder geometry, timing and calibration values.
    #[test]
    fn test_rejects_bad_geometry_and_timing() {
        let mut config = FlightConfig::new();
        config.slots_per_rev = 447;
        assert_eq!(
            Err(ConfigError::InvalidSlotsPerRevolution),
            config.validate()
        );

        let mut config = FlightConfig::new();
        config.tick_period_ms = 0;
        assert_eq!(Err(ConfigError::InvalidTickPeriod), config.validate());

        let mut config = FlightConfig::new();
        config.altitude_span = 0.0;
        assert_eq!(Err(ConfigError::InvalidCalibrationSpan), config.validate());

        let mut config = FlightConfig::new();
        config.max_rotations = 0;
        assert_eq!(Err(ConfigError::InvalidMaxRotations), config.validate());
    }

    /// Test altitude bounds and preset checks.
    #[test]
    fn test_rejects_bad_altitudes() {
        let mut config = FlightConfig::new();
        config.min_altitude = 60;
        config.max_altitude = 40;
        assert_eq!(Err(ConfigError::InvalidAltitudeBounds), config.validate());

        let mut config = FlightConfig::new();
        config.max_altitude = 40;
        assert_eq!(
            Err(ConfigError::PresetOutOfBounds("mid-flight")),
            config.validate()
        );

        let mut config = FlightConfig::new();
        config.landing_step = 0;
        assert_eq!(Err(ConfigError::InvalidStep("landing")), config.validate());
    }

    /// Test the derived helpers.
    #[test]
    fn test_helpers() {
        let config = FlightConfig::new();
        assert!((config.dt() - 0.01).abs() < 1e-6);
        assert_eq!(100, config.clamp_altitude(140));
        assert_eq!(0, config.clamp_altitude(-3));
        assert_eq!(4480, config.yaw_limit());
    }
}
