use crate::error::ConfigError;
use crate::QueueId;

/// RSS indirection table (RETA) as programmed into the device.
///
/// The low `log2(len)` bits of the hash index the table; the hardware masks rather than taking a
/// remainder, which is why the length must be a power of two.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndirectionTable {
    entries: Box<[QueueId]>,
    mask: u32,
}

impl IndirectionTable {
    pub fn new(entries: impl Into<Vec<QueueId>>) -> Result<Self, ConfigError> {
        let entries = entries.into().into_boxed_slice();
        let len = entries.len();
        if len == 0 {
            return Err(ConfigError::EmptyTable);
        }
        if !len.is_power_of_two() {
            return Err(ConfigError::TableLenNotPowerOfTwo { len });
        }
        let mask = u32::try_from(len - 1).map_err(|_| ConfigError::TableLenNotPowerOfTwo { len })?;
        Ok(Self { entries, mask })
    }

    /// The layout drivers program by default: `entry[i] = i % num_queues`.
    pub fn round_robin(len: usize, num_queues: u16) -> Result<Self, ConfigError> {
        if num_queues == 0 {
            return Err(ConfigError::NoQueues);
        }
        let entries: Vec<QueueId> = (0..len)
            .map(|i| (i % usize::from(num_queues)) as QueueId)
            .collect();
        Self::new(entries)
    }

    pub fn lookup(&self, hash: u32) -> QueueId {
        // `mask < len` by construction.
        self.entries[(hash & self.mask) as usize]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[QueueId] {
        &self.entries
    }

    /// Highest queue referenced by any entry.
    pub fn max_queue(&self) -> QueueId {
        self.entries.iter().copied().max().unwrap_or(0)
    }

    /// Fails if any entry selects a queue the device does not have.
    pub fn ensure_queues_below(&self, num_queues: u16) -> Result<(), ConfigError> {
        if num_queues == 0 {
            return Err(ConfigError::NoQueues);
        }
        match self
            .entries
            .iter()
            .enumerate()
            .find(|(_, &queue)| queue >= num_queues)
        {
            Some((index, &queue)) => Err(ConfigError::QueueOutOfRange {
                index,
                queue,
                num_queues,
            }),
            None => Ok(()),
        }
    }
}
