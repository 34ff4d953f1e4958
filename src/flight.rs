// src/flight.rs

//! # Flight Module
//!
//! The supervisory state machine that ties the altitude sampler, the yaw
//! tracker and the two rotor PID loops together, along with the traits it
//! uses to talk to the rest of the firmware.

pub mod flight_controller;
pub use flight_controller::*;
pub mod io;
pub use io::*;
pub mod state;
pub use state::*;
