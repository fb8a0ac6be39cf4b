use core::fmt;
use core::num::NonZeroU32;

use thiserror::Error;

use crate::error::ConfigError;
use crate::QueueId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Rx,
    Tx,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Rx => "rx",
            Direction::Tx => "tx",
        })
    }
}

/// One descriptor ring of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingId {
    pub queue: QueueId,
    pub direction: Direction,
}

impl RingId {
    pub const fn rx(queue: QueueId) -> Self {
        Self {
            queue,
            direction: Direction::Rx,
        }
    }

    pub const fn tx(queue: QueueId) -> Self {
        Self {
            queue,
            direction: Direction::Tx,
        }
    }
}

impl fmt::Display for RingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.direction, self.queue)
    }
}

/// A ring pointer read before and after a burst, plus the number of descriptors the packet
/// counters say were consumed in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RingPointerSample {
    ring_size: u32,
    pointer_before: u32,
    pointer_after: u32,
    counter_increment: u64,
}

impl RingPointerSample {
    pub fn new(
        ring_size: u32,
        pointer_before: u32,
        pointer_after: u32,
        counter_increment: u64,
    ) -> Result<Self, ConfigError> {
        if ring_size == 0 {
            return Err(ConfigError::ZeroRingSize);
        }
        Ok(Self {
            ring_size,
            pointer_before,
            pointer_after,
            counter_increment,
        })
    }

    pub fn ring_size(&self) -> u32 {
        self.ring_size
    }

    pub fn pointer_before(&self) -> u32 {
        self.pointer_before
    }

    pub fn pointer_after(&self) -> u32 {
        self.pointer_after
    }

    pub fn counter_increment(&self) -> u64 {
        self.counter_increment
    }

    /// `(pointer_before + counter_increment) mod ring_size`.
    pub fn expected_after(&self) -> u32 {
        let size = u64::from(self.ring_size);
        let advanced = u64::from(self.pointer_before) % size + self.counter_increment % size;
        // Both terms are below `size`, so the sum cannot overflow and the result fits in u32.
        (advanced % size) as u32
    }

    pub fn verify(&self) -> Result<(), RingWrapError> {
        let expected = self.expected_after();
        if self.pointer_after == expected {
            return Ok(());
        }
        Err(RingWrapError {
            ring_size: self.ring_size,
            pointer_before: self.pointer_before,
            pointer_after: self.pointer_after,
            counter_increment: self.counter_increment,
            expected,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("ring pointer moved {pointer_before} -> {pointer_after} after {counter_increment} descriptors, expected {expected} (ring size {ring_size})")]
pub struct RingWrapError {
    pub ring_size: u32,
    pub pointer_before: u32,
    pub pointer_after: u32,
    pub counter_increment: u64,
    pub expected: u32,
}

/// Checks `pointer_after == (pointer_before + counter_increment) mod ring_size`.
pub fn verify(
    ring_size: NonZeroU32,
    pointer_before: u32,
    pointer_after: u32,
    counter_increment: u64,
) -> Result<(), RingWrapError> {
    RingPointerSample {
        ring_size: ring_size.get(),
        pointer_before,
        pointer_after,
        counter_increment,
    }
    .verify()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingFailure {
    pub ring: RingId,
    pub error: RingWrapError,
}

/// Result of checking a set of rings. Failures keep the input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingReport {
    pub checked: usize,
    pub failures: Vec<RingFailure>,
}

impl RingReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Verifies every sample; never stops at the first mismatch.
pub fn verify_all<I>(samples: I) -> RingReport
where
    I: IntoIterator<Item = (RingId, RingPointerSample)>,
{
    let mut report = RingReport::default();
    for (ring, sample) in samples {
        report.checked += 1;
        if let Err(error) = sample.verify() {
            tracing::warn!(%ring, "{error}");
            report.failures.push(RingFailure { ring, error });
        }
    }
    tracing::debug!(
        checked = report.checked,
        failed = report.failures.len(),
        "ring pointer wraparound checked"
    );
    report
}
