// src/yaw/quadrature.rs

//! Two-channel quadrature decoding for the yaw encoder. Every level change on
//! either channel is one slot.

use core::sync::atomic::{AtomicU8, Ordering};

/// Direction of one encoder step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Counts up.
    Clockwise,
    /// Counts down.
    CounterClockwise,
}

impl Direction {
    /// Signed slot step for this direction.
    pub const fn step(self) -> i32 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

// Position of each `(a << 1) | b` channel state in the gray sequence 00, 01, 11, 10.
const GRAY_POSITION: [u8; 4] = [0, 1, 3, 2];

/// Quadrature state machine. Safe to call from interrupt context.
#[derive(Debug)]
pub struct QuadratureDecoder {
    state: AtomicU8,
}

impl QuadratureDecoder {
    /// Creates a decoder assuming both channels start low.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
        }
    }

    /// Records the channel levels without producing a step.
    pub fn seed(&self, a: bool, b: bool) {
        self.state.store(encode(a, b), Ordering::Relaxed);
    }

    /// Decodes the new channel levels into a step.
    ///
    /// Returns `None` when nothing changed, or when both channels changed at
    /// once and the direction cannot be known.
    pub fn decode(&self, a: bool, b: bool) -> Option<Direction> {
        let new = encode(a, b);
        let old = self.state.swap(new, Ordering::Relaxed);

        let delta = (GRAY_POSITION[usize::from(new)] + 4
            - GRAY_POSITION[usize::from(old & 0b11)])
            % 4;
        match delta {
            1 => Some(Direction::Clockwise),
            3 => Some(Direction::CounterClockwise),
            _ => None,
        }
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(a: bool, b: bool) -> u8 {
    (u8::from(a) << 1) | u8::from(b)
}
