use core::fmt;

use thiserror::Error;

use crate::QueueId;

/// Setup defects: a table, key or ring description that could not have come from a correctly
/// configured device. These abort a test immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("indirection table is empty")]
    EmptyTable,

    #[error("indirection table length {len} is not a power of two")]
    TableLenNotPowerOfTwo { len: usize },

    #[error("indirection table entry {index} selects queue {queue}, but the device has {num_queues} queues")]
    QueueOutOfRange {
        index: usize,
        queue: QueueId,
        num_queues: u16,
    },

    #[error("device must expose at least one receive queue")]
    NoQueues,

    #[error("RSS key is {actual_bits} bits, at least {required_bits} are required")]
    KeyTooShort {
        required_bits: usize,
        actual_bits: usize,
    },

    #[error("ring size must be non-zero")]
    ZeroRingSize,
}

/// A tuple field the Toeplitz input is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TupleField {
    SrcAddr,
    DstAddr,
    SrcPort,
    DstPort,
}

impl fmt::Display for TupleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TupleField::SrcAddr => "source address",
            TupleField::DstAddr => "destination address",
            TupleField::SrcPort => "source port",
            TupleField::DstPort => "destination port",
        })
    }
}

/// A tuple claims a hashed protocol but cannot be turned into a Toeplitz input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashInputError {
    #[error("hashable tuple is missing its {0}")]
    MissingField(TupleField),

    #[error("source and destination addresses belong to different IP families")]
    MixedAddressFamilies,
}

/// Failure of [`crate::QueueDistributionPredictor::predict`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("tuple #{index}: {source}")]
    HashInput {
        index: usize,
        #[source]
        source: HashInputError,
    },
}
