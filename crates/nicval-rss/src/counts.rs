use std::collections::BTreeMap;

use crate::QueueId;

/// Per-queue packet counts: a prediction, or an observed counter delta.
///
/// Queues that were never recorded read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct QueueCounts {
    counts: BTreeMap<QueueId, u64>,
}

impl QueueCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// All queues `0..num_queues` present with a zero count.
    pub fn zeroed(num_queues: u16) -> Self {
        Self {
            counts: (0..num_queues).map(|queue| (queue, 0)).collect(),
        }
    }

    pub fn get(&self, queue: QueueId) -> u64 {
        self.counts.get(&queue).copied().unwrap_or(0)
    }

    pub fn set(&mut self, queue: QueueId, count: u64) {
        self.counts.insert(queue, count);
    }

    pub fn add(&mut self, queue: QueueId, count: u64) {
        *self.counts.entry(queue).or_insert(0) += count;
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Recorded queues in ascending order.
    pub fn queues(&self) -> impl Iterator<Item = QueueId> + '_ {
        self.counts.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QueueId, u64)> + '_ {
        self.counts.iter().map(|(&queue, &count)| (queue, count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(QueueId, u64)> for QueueCounts {
    fn from_iter<I: IntoIterator<Item = (QueueId, u64)>>(iter: I) -> Self {
        let mut counts = QueueCounts::new();
        for (queue, count) in iter {
            counts.add(queue, count);
        }
        counts
    }
}

impl<const N: usize> From<[(QueueId, u64); N]> for QueueCounts {
    fn from(pairs: [(QueueId, u64); N]) -> Self {
        pairs.into_iter().collect()
    }
}
