// src/pid.rs

//! # PID Control Module
//!
//! This module provides the per-rotor PID controller and the compute
//! callback that implements its clamped control law.

pub mod axis;
pub use axis::*;
pub mod controller;
pub use controller::*;
