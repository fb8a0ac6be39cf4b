use std::collections::BTreeMap;

use nicval_rss::{QueueCounts, QueueId};

use crate::error::{DumpError, Result};

/// Placeholder for the queue index in counter name patterns, e.g. `rx_queue_{q}_packets`.
pub const QUEUE_PLACEHOLDER: &str = "{q}";

/// Named device counters sampled at one point in time (`ethtool -S` style).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    counters: BTreeMap<String, u64>,
}

/// Parse `name: value` lines. Lines with an empty value (section headers such as
/// `NIC statistics:`) are skipped.
pub fn parse_stats(text: &str) -> Result<CounterSnapshot> {
    let mut counters = BTreeMap::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .rsplit_once(':')
            .ok_or(DumpError::MalformedLine { line: line_no })?;
        let (name, value) = (name.trim(), value.trim());
        if value.is_empty() {
            continue;
        }
        let value: u64 = value.parse().map_err(|_| DumpError::InvalidNumber {
            line: line_no,
            value: value.to_string(),
        })?;
        if counters.insert(name.to_string(), value).is_some() {
            return Err(DumpError::Duplicate {
                line: line_no,
                name: name.to_string(),
            });
        }
    }
    Ok(CounterSnapshot { counters })
}

impl CounterSnapshot {
    pub fn get(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counters.iter().map(|(name, &value)| (name.as_str(), value))
    }

    /// Per-counter increase from `self` to `after`.
    ///
    /// Counters that only exist in `after` count from zero; a counter that disappeared or
    /// decreased is an error (the device was reset, or the wrong interface was sampled).
    pub fn delta(&self, after: &CounterSnapshot) -> Result<CounterSnapshot> {
        let mut counters = BTreeMap::new();
        for (name, &before) in &self.counters {
            let now = after.get(name).ok_or_else(|| DumpError::MissingCounter {
                name: name.clone(),
            })?;
            let diff = now
                .checked_sub(before)
                .ok_or_else(|| DumpError::CounterWentBackwards {
                    name: name.clone(),
                    before,
                    after: now,
                })?;
            counters.insert(name.clone(), diff);
        }
        for (name, &value) in &after.counters {
            counters.entry(name.clone()).or_insert(value);
        }
        Ok(CounterSnapshot { counters })
    }

    /// Per-queue counts from counters named by `pattern` (which contains [`QUEUE_PLACEHOLDER`])
    /// for queues `0..num_queues`.
    pub fn queue_counts(&self, pattern: &str, num_queues: u16) -> Result<QueueCounts> {
        if !pattern.contains(QUEUE_PLACEHOLDER) {
            return Err(DumpError::InvalidPattern(pattern.to_string()));
        }
        (0..num_queues)
            .map(|queue: QueueId| {
                let name = pattern.replace(QUEUE_PLACEHOLDER, &queue.to_string());
                self.get(&name)
                    .map(|count| (queue, count))
                    .ok_or(DumpError::MissingCounter { name })
            })
            .collect()
    }
}

impl FromIterator<(String, u64)> for CounterSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            counters: iter.into_iter().collect(),
        }
    }
}
