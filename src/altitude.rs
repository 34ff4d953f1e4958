// src/altitude.rs

//! # Altitude Sampler
//!
//! A fixed-capacity ring of raw altitude readings with a running sum, so both
//! insertion and averaging are O(1). The sampler is purely numeric: turning
//! the average into a height percentage against the ground reference is the
//! flight controller's job.
//!
//! The average is only reported once the ring has been filled. Until then
//! [`AltitudeSampler::average`] returns `None` and the flight controller
//! skips its tick.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::HistoryBuffer;

use crate::flight::io::AltitudeSource;

/// Ring buffer of raw altitude samples.
pub struct AltitudeSampler<const N: usize> {
    samples: HistoryBuffer<u16, N>,
    sum: u32,
}

impl<const N: usize> AltitudeSampler<N> {
    /// Creates an empty sampler.
    pub const fn new() -> Self {
        Self {
            samples: HistoryBuffer::new(),
            sum: 0,
        }
    }

    /// Inserts a sample, evicting the oldest one once the ring is full.
    pub fn insert(&mut self, sample: u16) {
        if self.is_full() {
            if let Some(oldest) = self.samples.oldest_ordered().next() {
                self.sum -= u32::from(*oldest);
            }
        }
        self.samples.write(sample);
        self.sum += u32::from(sample);
    }

    /// Mean of the ring, or `None` until it has been filled once.
    pub fn average(&self) -> Option<u16> {
        if !self.is_full() {
            return None;
        }
        // The mean of u16 values always fits in a u16.
        Some((self.sum / N as u32) as u16)
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when no sample has been inserted.
    pub fn is_empty(&self) -> bool {
        self.samples.len() == 0
    }

    /// Returns `true` once `N` samples have been inserted.
    pub fn is_full(&self) -> bool {
        self.samples.len() == N
    }

    /// Drops every sample. The average is invalid until the ring refills.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0;
    }
}

impl<const N: usize> Default for AltitudeSampler<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// An [`AltitudeSampler`] shared between the sampling task and the control
/// tick. Each access is a short critical section.
pub struct SharedAltitude<const N: usize> {
    inner: Mutex<RefCell<AltitudeSampler<N>>>,
}

impl<const N: usize> SharedAltitude<N> {
    /// Creates an empty shared sampler, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(AltitudeSampler::new())),
        }
    }

    /// Inserts a sample from the sampling task.
    pub fn insert(&self, sample: u16) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).insert(sample));
    }

    /// Current average, or `None` while the ring is still filling.
    pub fn average(&self) -> Option<u16> {
        critical_section::with(|cs| self.inner.borrow_ref(cs).average())
    }

    /// Drops every sample.
    pub fn clear(&self) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).clear());
    }
}

impl<const N: usize> Default for SharedAltitude<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> AltitudeSource for SharedAltitude<N> {
    fn average(&self) -> Option<u16> {
        SharedAltitude::average(self)
    }
}

impl<const N: usize> AltitudeSource for AltitudeSampler<N> {
    fn average(&self) -> Option<u16> {
        AltitudeSampler::average(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test the moving average and the eviction of the oldest sample.
    #[test]
    fn test_ring_average() {
        let mut sampler = AltitudeSampler::<3>::new();
        sampler.insert(10);
        sampler.insert(20);
        sampler.insert(30);
        assert_eq!(Some(20), sampler.average());

        sampler.insert(40);
        assert_eq!(Some(30), sampler.average());
        assert_eq!(3, sampler.len());
    }

    /// Test that the average stays invalid until the ring is full.
    #[test]
    fn test_average_invalid_until_full() {
        let mut sampler = AltitudeSampler::<4>::new();
        assert_eq!(None, sampler.average());
        assert!(sampler.is_empty());

        for sample in [100, 200, 300] {
            sampler.insert(sample);
            assert_eq!(None, sampler.average());
        }

        sampler.insert(400);
        assert_eq!(Some(250), sampler.average());
    }

    /// Test that the running sum does not drift over many evictions.
    #[test]
    fn test_running_sum_stable() {
        let mut sampler = AltitudeSampler::<10>::new();
        for i in 0..10_000u32 {
            sampler.insert((i % 4096) as u16);
        }
        for _ in 0..10 {
            sampler.insert(4095);
        }
        assert_eq!(Some(4095), sampler.average());
    }

    /// Test that clearing invalidates the average.
    #[test]
    fn test_clear() {
        let mut sampler = AltitudeSampler::<2>::new();
        sampler.insert(7);
        sampler.insert(9);
        assert_eq!(Some(8), sampler.average());

        sampler.clear();
        assert_eq!(None, sampler.average());
        sampler.insert(1);
        sampler.insert(3);
        assert_eq!(Some(2), sampler.average());
    }

    /// Test the critical-section wrapper used across tasks.
    #[test]
    fn test_shared_altitude() {
        static ALTITUDE: SharedAltitude<3> = SharedAltitude::new();

        ALTITUDE.insert(10);
        ALTITUDE.insert(20);
        assert_eq!(None, AltitudeSource::average(&ALTITUDE));
        ALTITUDE.insert(30);
        assert_eq!(Some(20), AltitudeSource::average(&ALTITUDE));

        ALTITUDE.clear();
        assert_eq!(None, ALTITUDE.average());
    }
}
