//! The "current reading" shared between the acquisition thread and the display.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// One loudness estimate as published to the display.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    pub decibels: f32,
    pub threshold_exceeded: bool,
}

impl Reading {
    fn pack(self) -> u64 {
        (u64::from(self.decibels.to_bits()) << 32) | u64::from(self.threshold_exceeded)
    }

    fn unpack(bits: u64) -> Self {
        Self {
            decibels: f32::from_bits((bits >> 32) as u32),
            threshold_exceeded: bits & 1 == 1,
        }
    }
}

/// Single-slot cell holding the newest [`Reading`].
///
/// Every `publish` overwrites the previous value (last write wins) and no
/// history is kept. Readers may miss intermediate readings but always observe
/// a decibel value together with the flag that was published alongside it.
#[derive(Clone, Debug)]
pub struct ReadingCell {
    slot: Arc<AtomicU64>,
}

impl ReadingCell {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(AtomicU64::new(Reading::default().pack())),
        }
    }

    pub fn publish(&self, reading: Reading) {
        self.slot.store(reading.pack(), Ordering::Release);
    }

    pub fn observe(&self) -> Reading {
        Reading::unpack(self.slot.load(Ordering::Acquire))
    }
}

impl Default for ReadingCell {
    fn default() -> Self {
        Self::new()
    }
}
