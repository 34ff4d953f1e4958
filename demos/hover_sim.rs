// demos/hover_sim.rs

use heli_flight_core::{
    Direction, FlightConfig, FlightController, FlightMode, PilotCommand, Rotor, RotorDrive,
    SharedAltitude, SwitchEvent, SwitchInput, YawTracker,
};

const GROUND: f32 = 3000.0;
const REFERENCE_SLOT: i32 = 100;
const MAX_TICKS: u32 = 8000;

static ALTITUDE: SharedAltitude<8> = SharedAltitude::new();
static YAW: YawTracker = YawTracker::from_config(&FlightConfig::DEFAULT);

#[derive(Default)]
struct FlightSwitch {
    pending: Option<SwitchEvent>,
}

impl SwitchInput for FlightSwitch {
    fn poll(&mut self) -> SwitchEvent {
        self.pending.take().unwrap_or_default()
    }
}

#[derive(Default)]
struct Pwm {
    main: u16,
    tail: u16,
}

impl RotorDrive for Pwm {
    fn set_duty(&mut self, rotor: Rotor, _frequency_hz: u32, duty: u16) {
        match rotor {
            Rotor::Main => self.main = duty,
            Rotor::Tail => self.tail = duty,
        }
    }
}

/// Crude rig model: thrust against gravity, rotor torque against the tail.
struct Rig {
    altitude: f32,
    climb_rate: f32,
    heading: f32,
    slots_emitted: i32,
}

impl Rig {
    fn step(&mut self, main: u16, tail: u16, dt: f32) {
        let main = f32::from(main);
        let tail = f32::from(tail);

        let accel = (main - 40.0) * 0.5 - self.climb_rate * 1.5;
        self.climb_rate += accel * dt;
        self.altitude += self.climb_rate * dt;
        if self.altitude < 0.0 {
            self.altitude = 0.0;
            self.climb_rate = 0.0;
        }

        let yaw_rate = if self.altitude > 0.5 {
            (tail - 0.6 * main) * 4.0
        } else {
            0.0
        };
        self.heading += yaw_rate * dt;

        // Feed the tracker one edge at a time, like the encoder interrupt.
        let target = self.heading.floor() as i32;
        while self.slots_emitted != target {
            let direction = if target > self.slots_emitted {
                Direction::Clockwise
            } else {
                Direction::CounterClockwise
            };
            self.slots_emitted += direction.step();
            YAW.on_edge(direction);
            if self.slots_emitted.rem_euclid(448) == REFERENCE_SLOT {
                YAW.on_reference_mark();
            }
        }
    }

    fn raw_altitude(&self) -> u16 {
        (GROUND - self.altitude / 100.0 * FlightConfig::DEFAULT.altitude_span) as u16
    }
}

fn main() {
    let config = FlightConfig::new();
    let dt = config.dt();
    let mut controller = match FlightController::new(
        config,
        &ALTITUDE,
        &YAW,
        FlightSwitch::default(),
        Pwm::default(),
    ) {
        Ok(controller) => controller,
        Err(err) => {
            eprintln!("{}", err);
            return;
        }
    };

    let mut rig = Rig {
        altitude: 0.0,
        climb_rate: 0.0,
        heading: 37.0,
        slots_emitted: 37,
    };
    for _ in 0..37 {
        YAW.on_edge(Direction::Clockwise);
    }

    println!("  tick  mode            alt  target   yaw  target  main  tail");
    for tick in 0..MAX_TICKS {
        ALTITUDE.insert(rig.raw_altitude());

        match tick {
            20 => controller.switch_mut().pending = Some(SwitchEvent::Pushed),
            1500 => {
                controller.apply_command(PilotCommand::HeightUp);
                controller.apply_command(PilotCommand::HeightUp);
            }
            2500 => controller.apply_command(PilotCommand::SpinHalfTurn),
            3500 => controller.switch_mut().pending = Some(SwitchEvent::Released),
            _ => {}
        }

        controller.update_controllers();
        let duty = controller.last_duty();
        rig.step(duty.main, duty.tail, dt);

        let state = controller.state();
        if tick % 100 == 0 {
            println!(
                "{:6}  {:<14} {:4}  {:6}  {:4}  {:6}  {:4}  {:4}",
                tick,
                format!("{:?}", state.mode),
                state.current_altitude_percent,
                state.target_altitude_percent,
                state.current_yaw,
                state.target_yaw,
                duty.main,
                duty.tail,
            );
        }

        if tick > 3500 && state.mode == FlightMode::Landed {
            println!("landed after {} ticks", tick);
            break;
        }
    }
}
