// src/flight/flight_controller.rs

//! # Flight State Machine
//!
//! [`FlightController`] owns the flight state and both rotor PID loops. The
//! outer firmware calls [`FlightController::update_controllers`] once per
//! control tick. Each tick reads the averaged altitude, drains the yaw events,
//! reads the yaw count, runs the step for the current mode and writes both
//! rotor duties, in that order.
//!
//! ## Modes
//!
//! - `Landed`: rotors off, the ground reference follows the altitude average,
//!   the flight switch being pushed starts `FindReference`.
//! - `FindReference`: hold a low altitude and sweep the yaw target slowly until
//!   the reference mark is seen, then fly.
//! - `Flying`: track the altitude and yaw targets. Releasing the switch lands.
//! - `Landing`: turn back to the reference heading, then step the altitude
//!   target down until the vehicle is on the ground.
//!
//! ## Failure handling
//!
//! A tick without a valid altitude average does nothing at all: no PID update,
//! no rotor write and no mode change. An unknown raw mode, or an explicit
//! [`FlightController::halt`], latches a halt that keeps both rotors at zero.
//!
//! ## Loop state across modes
//!
//! Both PID loops are reset on entry to `Landed` and to `FindReference`.
//! Integral and derivative state carries through `FindReference`, `Flying`
//! and `Landing`.

use crate::config::FlightConfig;
use crate::error::FlightResult;
use crate::flight::io::{AltitudeSource, Rotor, RotorDrive, SwitchEvent, SwitchInput};
use crate::flight::state::{FlightMode, FlightState, PilotCommand, RotorDuty};
use crate::pid::PidController;
use crate::yaw::{ReferenceMode, YawEvent, YawTracker};

/// Supervisory controller for the main and tail rotors.
pub struct FlightController<'a, A, S, R>
where
    A: AltitudeSource,
    S: SwitchInput,
    R: RotorDrive,
{
    config: FlightConfig,
    state: FlightState,
    main_pid: PidController,
    tail_pid: PidController,
    altitude: &'a A,
    yaw: &'a YawTracker,
    switch: S,
    rotors: R,
    last_duty: RotorDuty,
    halted: bool,
}

impl<'a, A, S, R> FlightController<'a, A, S, R>
where
    A: AltitudeSource,
    S: SwitchInput,
    R: RotorDrive,
{
    /// Validates `config`, builds both PID loops and starts `Landed` with
    /// the rotors off.
    pub fn new(
        config: FlightConfig,
        altitude: &'a A,
        yaw: &'a YawTracker,
        switch: S,
        rotors: R,
    ) -> FlightResult<Self> {
        config.validate()?;
        yaw.set_reference_mode(ReferenceMode::Locate);

        let mut controller = FlightController {
            config,
            state: FlightState {
                mode: FlightMode::Landed,
                target_altitude_percent: config.clamp_altitude(0),
                ..FlightState::default()
            },
            main_pid: PidController::new(config.main),
            tail_pid: PidController::new(config.tail),
            altitude,
            yaw,
            switch,
            rotors,
            last_duty: RotorDuty::default(),
            halted: false,
        };
        controller.drive(0, 0);
        info!("flight controller ready");
        Ok(controller)
    }

    /// Runs one control tick.
    pub fn update_controllers(&mut self) {
        if self.halted {
            self.drive(0, 0);
            return;
        }

        let Some(average) = self.altitude.average() else {
            trace!("no altitude average, tick skipped");
            return;
        };

        while let Some(event) = self.yaw.take_event() {
            self.handle_yaw_event(event);
        }

        self.state.current_altitude_percent = self.altitude_percent(average);
        self.state.current_yaw = self.yaw.current();
        let switch = self.switch.poll();

        match self.state.mode {
            FlightMode::Landed => self.step_landed(average, switch),
            FlightMode::FindReference => self.step_find_reference(switch),
            FlightMode::Flying => self.step_flying(switch),
            FlightMode::Landing => self.step_landing(),
        }
    }

    /// Changes mode and runs its entry actions.
    pub fn set_helicopter_state(&mut self, mode: FlightMode) {
        let previous = self.state.mode;
        match mode {
            FlightMode::Landed => {
                self.yaw.set_reference_mode(ReferenceMode::Locate);
                self.reset_loops();
                self.drive(0, 0);
            }
            FlightMode::FindReference => {
                self.reset_loops();
                self.yaw.clear_events();
                self.yaw.set_reference_mode(ReferenceMode::Locate);
                self.state.target_yaw = self.clamp_yaw(self.yaw.current());
            }
            FlightMode::Flying | FlightMode::Landing => {}
        }
        self.state.mode = mode;
        info!("flight mode {} -> {}", previous, mode);
    }

    /// Changes mode from a raw mode value.
    ///
    /// A value that names no mode halts actuation and is returned as
    /// [`FlightError::UnknownMode`](crate::error::FlightError::UnknownMode).
    pub fn set_helicopter_state_raw(&mut self, raw: u8) -> FlightResult<()> {
        match FlightMode::try_from(raw) {
            Ok(mode) => {
                self.set_helicopter_state(mode);
                Ok(())
            }
            Err(err) => {
                error!("unknown flight mode {}", raw);
                self.halt();
                Err(err)
            }
        }
    }

    /// Current mode.
    pub fn get_helicopter_state(&self) -> FlightMode {
        self.state.mode
    }

    /// Stops both rotors and keeps them stopped on every later tick.
    pub fn halt(&mut self) {
        self.halted = true;
        self.drive(0, 0);
        error!("actuation halted");
    }

    /// Returns `true` once [`FlightController::halt`] has run.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Raises the altitude target one step, up to the configured maximum.
    pub fn increment_height(&mut self) {
        let target = self
            .state
            .target_altitude_percent
            .saturating_add(self.config.height_step);
        self.set_height_target(target);
    }

    /// Lowers the altitude target one step, down to the configured minimum.
    pub fn decrement_height(&mut self) {
        let target = self
            .state
            .target_altitude_percent
            .saturating_sub(self.config.height_step);
        self.set_height_target(target);
    }

    /// Turns the yaw target one step clockwise.
    pub fn increment_angle(&mut self) {
        let target = self.state.target_yaw.saturating_add(self.config.yaw_step);
        self.set_yaw_target(target);
    }

    /// Turns the yaw target one step counter-clockwise.
    pub fn decrement_angle(&mut self) {
        let target = self.state.target_yaw.saturating_sub(self.config.yaw_step);
        self.set_yaw_target(target);
    }

    /// Turns the yaw target half a revolution.
    pub fn spin_half_turn(&mut self) {
        let target = self
            .state
            .target_yaw
            .saturating_add(self.config.slots_per_rev / 2);
        self.set_yaw_target(target);
    }

    /// Loads the mid-flight altitude target.
    pub fn mid_flight_adjustment(&mut self) {
        self.set_height_target(self.config.mid_flight_altitude);
    }

    /// Sets the yaw target, clamped to the configured rotation limit.
    pub fn set_yaw_target(&mut self, target: i32) {
        self.state.target_yaw = self.clamp_yaw(target);
    }

    /// Sets the altitude target, clamped to the configured bounds.
    pub fn set_height_target(&mut self, target: i16) {
        self.state.target_altitude_percent = self.config.clamp_altitude(target);
    }

    /// Overrides the ground reference. `Landed` recalibrates it every tick.
    pub fn set_ground_reference(&mut self, reading: u16) {
        self.state.ground_reference = reading;
    }

    /// Applies a pilot command.
    pub fn apply_command(&mut self, command: PilotCommand) {
        match command {
            PilotCommand::HeightUp => self.increment_height(),
            PilotCommand::HeightDown => self.decrement_height(),
            PilotCommand::YawLeft => self.decrement_angle(),
            PilotCommand::YawRight => self.increment_angle(),
            PilotCommand::SpinHalfTurn => self.spin_half_turn(),
            PilotCommand::MidFlight => self.mid_flight_adjustment(),
        }
    }

    /// Flight state after the last tick.
    pub fn state(&self) -> &FlightState {
        &self.state
    }

    /// Duties last written to the rotors.
    pub fn last_duty(&self) -> RotorDuty {
        self.last_duty
    }

    /// Configuration in use.
    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    /// Main rotor loop.
    pub fn main_pid(&self) -> &PidController {
        &self.main_pid
    }

    /// Tail rotor loop.
    pub fn tail_pid(&self) -> &PidController {
        &self.tail_pid
    }

    /// Rotor output collaborator.
    pub fn rotors(&self) -> &R {
        &self.rotors
    }

    /// Mutable access to the rotor output collaborator.
    pub fn rotors_mut(&mut self) -> &mut R {
        &mut self.rotors
    }

    /// Mutable access to the flight switch collaborator.
    pub fn switch_mut(&mut self) -> &mut S {
        &mut self.switch
    }

    fn step_landed(&mut self, average: u16, switch: SwitchEvent) {
        self.state.ground_reference = average;
        self.state.current_altitude_percent = 0;
        self.state.target_yaw = 0;
        self.state.target_altitude_percent = self.config.hover_altitude;
        self.drive(0, 0);

        if switch == SwitchEvent::Pushed {
            self.set_helicopter_state(FlightMode::FindReference);
        }
    }

    fn step_find_reference(&mut self, switch: SwitchEvent) {
        self.state.target_altitude_percent = self.config.find_reference_altitude;
        let target = self.state.target_yaw.saturating_add(self.config.sweep_step);
        self.state.target_yaw = self.clamp_yaw(target);
        self.run_loops();

        if switch == SwitchEvent::Released {
            self.set_helicopter_state(FlightMode::Landing);
        }
    }

    fn step_flying(&mut self, switch: SwitchEvent) {
        self.run_loops();

        if switch == SwitchEvent::Released {
            self.set_helicopter_state(FlightMode::Landing);
        }
    }

    fn step_landing(&mut self) {
        self.state.target_yaw = 0;
        let yaw_error = self.yaw.shortest_path(0, self.state.current_yaw);
        let altitude = self.state.current_altitude_percent;

        if yaw_error.abs() < self.config.landing_yaw_tolerance
            || altitude <= self.config.final_descent_altitude
        {
            let target = self
                .state
                .target_altitude_percent
                .saturating_sub(self.config.landing_step);
            self.set_height_target(target);
        }

        if self.state.target_altitude_percent <= self.config.landing_floor
            || altitude < self.config.landing_floor
        {
            self.set_helicopter_state(FlightMode::Landed);
            return;
        }

        self.run_loops();
    }

    fn run_loops(&mut self) {
        let altitude_error = i32::from(self.state.target_altitude_percent)
            - i32::from(self.state.current_altitude_percent);
        let yaw_error = self
            .yaw
            .shortest_path(self.state.target_yaw, self.state.current_yaw);
        let dt = self.config.dt();

        let main = self.main_pid.update(altitude_error as f32, dt);
        let tail = self.tail_pid.update(yaw_error as f32, dt);
        self.drive(main, tail);
    }

    fn handle_yaw_event(&mut self, event: YawEvent) {
        match event {
            YawEvent::ReferenceFound if self.state.mode == FlightMode::FindReference => {
                info!("yaw reference found");
                self.state.target_yaw = 0;
                self.yaw.set_reference_mode(ReferenceMode::Resync);
                self.set_helicopter_state(FlightMode::Flying);
            }
            YawEvent::ReferenceFound => {
                trace!("reference mark ignored in {}", self.state.mode);
            }
            YawEvent::Resynced { correction } => {
                debug!("yaw drift corrected by {} slots", correction);
            }
            YawEvent::Rebased { offset } => {
                let target = self.state.target_yaw.saturating_sub(offset);
                self.state.target_yaw = self.clamp_yaw(target);
            }
        }
    }

    fn reset_loops(&mut self) {
        self.main_pid.reset();
        self.tail_pid.reset();
    }

    fn drive(&mut self, main: u16, tail: u16) {
        let frequency = self.config.pwm_frequency_hz;
        self.rotors.set_duty(Rotor::Main, frequency, main);
        self.rotors.set_duty(Rotor::Tail, frequency, tail);
        self.last_duty = RotorDuty { main, tail };
    }

    fn altitude_percent(&self, average: u16) -> i16 {
        let drop = f32::from(self.state.ground_reference) - f32::from(average);
        (drop / self.config.altitude_span * 100.0) as i16
    }

    fn clamp_yaw(&self, target: i32) -> i32 {
        let limit = self.config.yaw_limit();
        target.clamp(-limit, limit)
    }
}
