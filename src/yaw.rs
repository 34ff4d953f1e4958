// src/yaw.rs

//! # Yaw Tracker
//!
//! Signed slot counter fed by encoder edges, plus the handling of the
//! once-per-revolution reference mark.
//!
//! The counter is written from interrupt context and read by the control
//! tick. Single edges are atomic adds. The reference handler does a
//! read-modify-write inside a critical section and only ever *adds* its
//! correction, so an edge that lands between the read and the write is kept.
//!
//! What a reference mark does depends on the [`ReferenceMode`]:
//!
//! - [`ReferenceMode::Locate`]: the first mark after landing zeroes the
//!   counter and emits [`YawEvent::ReferenceFound`].
//! - [`ReferenceMode::Resync`]: the counter is snapped to the nearest whole
//!   revolution, correcting missed or extra edges without touching any target.
//!   Once the count reaches the configured rotation limit it is rebased to
//!   zero instead and [`YawEvent::Rebased`] tells the flight controller how far
//!   to shift its target.
//!
//! Events reach the control tick through a small channel. Interrupt context
//! only ever uses `try_send`.

pub mod quadrature;
pub use quadrature::*;

use core::sync::atomic::{AtomicI32, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::config::FlightConfig;

/// Depth of the reference event queue.
pub const EVENT_QUEUE_DEPTH: usize = 4;

/// How the next reference mark is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReferenceMode {
    /// Zero the counter and report that the reference was found.
    Locate = 0,
    /// Snap the counter to the nearest whole revolution.
    Resync = 1,
}

/// Notification raised by the reference handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum YawEvent {
    /// The reference mark passed while locating. The counter is now zero.
    ReferenceFound,
    /// The counter was snapped by `correction` slots.
    Resynced {
        /// Slots added to the counter.
        correction: i32,
    },
    /// The counter was rebased to zero from `offset` slots.
    Rebased {
        /// Whole-revolution position the counter was moved away from.
        offset: i32,
    },
}

/// Yaw position in encoder slots.
pub struct YawTracker {
    count: AtomicI32,
    mode: AtomicU8,
    slots_per_rev: i32,
    rebase_limit: i32,
    quadrature: QuadratureDecoder,
    events: Channel<CriticalSectionRawMutex, YawEvent, EVENT_QUEUE_DEPTH>,
}

impl YawTracker {
    /// Creates a tracker at slot zero in [`ReferenceMode::Locate`].
    pub const fn new(slots_per_rev: i32, max_rotations: i32) -> Self {
        Self {
            count: AtomicI32::new(0),
            mode: AtomicU8::new(ReferenceMode::Locate as u8),
            slots_per_rev,
            rebase_limit: slots_per_rev.saturating_mul(max_rotations),
            quadrature: QuadratureDecoder::new(),
            events: Channel::new(),
        }
    }

    /// Creates a tracker from the encoder geometry in `config`.
    pub const fn from_config(config: &FlightConfig) -> Self {
        Self::new(config.slots_per_rev, config.max_rotations)
    }

    /// Edge handler. Moves the counter one slot.
    pub fn on_edge(&self, direction: Direction) {
        self.count.fetch_add(direction.step(), Ordering::Relaxed);
    }

    /// Channel-level handler. Decodes the quadrature state and counts the step.
    pub fn on_channels(&self, a: bool, b: bool) {
        if let Some(direction) = self.quadrature.decode(a, b) {
            self.on_edge(direction);
        }
    }

    /// Records the current channel levels without counting.
    pub fn seed_channels(&self, a: bool, b: bool) {
        self.quadrature.seed(a, b);
    }

    /// Reference mark handler.
    pub fn on_reference_mark(&self) {
        critical_section::with(|_cs| {
            let current = self.count.load(Ordering::Relaxed);
            match self.reference_mode() {
                ReferenceMode::Locate => {
                    self.count.fetch_sub(current, Ordering::Relaxed);
                    self.publish(YawEvent::ReferenceFound);
                }
                ReferenceMode::Resync => {
                    let correction = snap_correction(current, self.slots_per_rev);
                    let snapped = current.saturating_add(correction);
                    if snapped.unsigned_abs() >= self.rebase_limit.unsigned_abs() {
                        self.count.fetch_sub(current, Ordering::Relaxed);
                        debug!("yaw rebased from {}", snapped);
                        self.publish(YawEvent::Rebased { offset: snapped });
                    } else if correction != 0 {
                        self.count.fetch_add(correction, Ordering::Relaxed);
                        debug!("yaw resynced by {}", correction);
                        self.publish(YawEvent::Resynced { correction });
                    }
                }
            }
        });
    }

    /// Live slot count.
    pub fn current(&self) -> i32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Zeroes the counter.
    pub fn reset(&self) {
        critical_section::with(|_cs| {
            let current = self.count.load(Ordering::Relaxed);
            self.count.fetch_sub(current, Ordering::Relaxed);
        });
    }

    /// Selects how the next reference mark is handled.
    pub fn set_reference_mode(&self, mode: ReferenceMode) {
        self.mode.store(mode as u8, Ordering::Relaxed);
    }

    /// Current reference handling.
    pub fn reference_mode(&self) -> ReferenceMode {
        match self.mode.load(Ordering::Relaxed) {
            0 => ReferenceMode::Locate,
            _ => ReferenceMode::Resync,
        }
    }

    /// Takes the oldest pending event.
    pub fn take_event(&self) -> Option<YawEvent> {
        self.events.try_receive().ok()
    }

    /// Drops every pending event.
    pub fn clear_events(&self) {
        while self.events.try_receive().is_ok() {}
    }

    /// Slots in one revolution.
    pub fn slots_per_rev(&self) -> i32 {
        self.slots_per_rev
    }

    /// Yaw error from `current` to `target`, by the shorter direction.
    pub fn shortest_path(&self, target: i32, current: i32) -> i32 {
        shortest_path(target, current, self.slots_per_rev)
    }

    /// Converts a slot count to whole degrees.
    pub fn slots_to_degrees(&self, slots: i32) -> i32 {
        slots_to_degrees(slots, self.slots_per_rev)
    }

    fn publish(&self, event: YawEvent) {
        if self.events.try_send(event).is_err() {
            warn!("yaw event queue full, dropped {}", event);
        }
    }
}

/// Wraps `target - current` into `(-slots_per_rev / 2, slots_per_rev / 2]`.
pub fn shortest_path(target: i32, current: i32, slots_per_rev: i32) -> i32 {
    if slots_per_rev <= 0 {
        return target.saturating_sub(current);
    }
    let revolution = i64::from(slots_per_rev);
    let wrapped = (i64::from(target) - i64::from(current)).rem_euclid(revolution);
    let error = if wrapped > revolution / 2 {
        wrapped - revolution
    } else {
        wrapped
    };
    // |error| <= slots_per_rev / 2, which fits in an i32.
    error as i32
}

/// Signed slots to add to `count` to land on the nearest whole revolution.
///
/// Halfway cases move toward zero.
pub fn snap_correction(count: i32, slots_per_rev: i32) -> i32 {
    if slots_per_rev <= 0 {
        return 0;
    }
    let revolution = i64::from(slots_per_rev);
    let drift = i64::from(count.unsigned_abs()) % revolution;
    let change = if drift > revolution / 2 {
        revolution - drift
    } else {
        -drift
    };
    let change = if count < 0 { -change } else { change };
    change as i32
}

/// Converts slots to whole degrees, truncating toward zero.
pub fn slots_to_degrees(slots: i32, slots_per_rev: i32) -> i32 {
    if slots_per_rev <= 0 {
        return 0;
    }
    (i64::from(slots) * 360 / i64::from(slots_per_rev)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOTS: i32 = 448;

    fn tracker() -> YawTracker {
        YawTracker::new(SLOTS, 10)
    }

    fn step(tracker: &YawTracker, direction: Direction, count: usize) {
        for _ in 0..count {
            tracker.on_edge(direction);
        }
    }

    /// Test that edges move the counter in both directions.
    #[test]
    fn test_edges() {
        let yaw = tracker();
        step(&yaw, Direction::Clockwise, 10);
        step(&yaw, Direction::CounterClockwise, 3);
        assert_eq!(7, yaw.current());

        step(&yaw, Direction::CounterClockwise, 20);
        assert_eq!(-13, yaw.current());
    }

    /// Test that channel levels are decoded into counts.
    #[test]
    fn test_channels() {
        let yaw = tracker();
        for (a, b) in [(false, true), (true, true), (true, false), (false, false)] {
            yaw.on_channels(a, b);
        }
        assert_eq!(4, yaw.current());
        yaw.on_channels(true, false);
        assert_eq!(3, yaw.current());
    }

    /// Test that the error always takes the shorter way round.
    #[test]
    fn test_shortest_path_wrap() {
        assert_eq!(48, shortest_path(0, 400, SLOTS));
        assert_eq!(-48, shortest_path(400, 0, SLOTS));
        assert_eq!(224, shortest_path(224, 0, SLOTS));
        assert_eq!(224, shortest_path(0, 224, SLOTS));
        assert_eq!(-223, shortest_path(0, 223, SLOTS));
        assert_eq!(0, shortest_path(896, 0, SLOTS));
        assert_eq!(10, shortest_path(-438, 0, SLOTS));
        // 2^32 - 1 slots apart, no overflow.
        assert_eq!(-193, shortest_path(i32::MAX, i32::MIN, SLOTS));
    }

    /// Test that the wrapped error always lies in the half-open range.
    #[test]
    fn test_shortest_path_range() {
        for target in (-2000..2000).step_by(37) {
            for current in (-2000..2000).step_by(41) {
                let error = shortest_path(target, current, SLOTS);
                assert!(error > -SLOTS / 2 && error <= SLOTS / 2);
                assert_eq!(0, (target - current - error).rem_euclid(SLOTS));
            }
        }
    }

    /// Test the snap correction toward the nearest revolution.
    #[test]
    fn test_snap_correction() {
        assert_eq!(0, snap_correction(0, SLOTS));
        assert_eq!(-3, snap_correction(451, SLOTS));
        assert_eq!(2, snap_correction(446, SLOTS));
        assert_eq!(3, snap_correction(-451, SLOTS));
        assert_eq!(-148, snap_correction(-300, SLOTS));
        assert_eq!(-224, snap_correction(224, SLOTS));
        assert_eq!(224, snap_correction(-224, SLOTS));
    }

    /// Test that a locate-mode reference mark zeroes the counter.
    #[test]
    fn test_locate_reference() {
        let yaw = tracker();
        step(&yaw, Direction::Clockwise, 123);
        yaw.on_reference_mark();

        assert_eq!(0, yaw.current());
        assert_eq!(Some(YawEvent::ReferenceFound), yaw.take_event());
        assert_eq!(None, yaw.take_event());
    }

    /// Test that a resync snaps drift without discarding position.
    #[test]
    fn test_resync_reference() {
        let yaw = tracker();
        yaw.set_reference_mode(ReferenceMode::Resync);
        step(&yaw, Direction::Clockwise, 2 * SLOTS as usize + 5);
        yaw.on_reference_mark();

        assert_eq!(2 * SLOTS, yaw.current());
        assert_eq!(Some(YawEvent::Resynced { correction: -5 }), yaw.take_event());

        // Already aligned: nothing to report.
        yaw.on_reference_mark();
        assert_eq!(2 * SLOTS, yaw.current());
        assert_eq!(None, yaw.take_event());
    }

    /// Test the rebase once the rotation limit is reached.
    #[test]
    fn test_rebase_at_rotation_limit() {
        let yaw = YawTracker::new(SLOTS, 2);
        yaw.set_reference_mode(ReferenceMode::Resync);
        step(&yaw, Direction::CounterClockwise, 2 * SLOTS as usize - 2);
        yaw.on_reference_mark();

        assert_eq!(0, yaw.current());
        assert_eq!(
            Some(YawEvent::Rebased { offset: -2 * SLOTS }),
            yaw.take_event()
        );
    }

    /// Test that a full event queue drops events without blocking.
    #[test]
    fn test_event_queue_overflow() {
        let yaw = tracker();
        for _ in 0..EVENT_QUEUE_DEPTH + 3 {
            yaw.on_reference_mark();
        }
        let mut received = 0;
        while yaw.take_event().is_some() {
            received += 1;
        }
        assert_eq!(EVENT_QUEUE_DEPTH, received);

        yaw.on_reference_mark();
        yaw.clear_events();
        assert_eq!(None, yaw.take_event());
    }

    /// Test the degree conversion and reset.
    #[test]
    fn test_degrees_and_reset() {
        let yaw = tracker();
        assert_eq!(90, yaw.slots_to_degrees(112));
        assert_eq!(-180, yaw.slots_to_degrees(-224));
        assert_eq!(360, yaw.slots_to_degrees(448));

        yaw.set_reference_mode(ReferenceMode::Resync);
        step(&yaw, Direction::Clockwise, 50);
        yaw.reset();
        assert_eq!(0, yaw.current());
        // Only the count is cleared.
        assert_eq!(ReferenceMode::Resync, yaw.reference_mode());
    }

    /// Test that seeded channel levels are not counted.
    #[test]
    fn test_seed_channels() {
        let yaw = tracker();
        yaw.seed_channels(true, true);
        assert_eq!(0, yaw.current());

        // 11 -> 10 is one step forward from the seeded state.
        yaw.on_channels(true, false);
        assert_eq!(1, yaw.current());
    }
}
