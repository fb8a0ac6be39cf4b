use crate::counts::QueueCounts;
use crate::error::{ConfigError, HashInputError, PredictError};
use crate::indirection::IndirectionTable;
use crate::key::RssKey;
use crate::toeplitz::hash_tuple;
use crate::tuple::{HashedProtocols, PacketTuple};
use crate::QueueId;

/// Queue the device steers traffic to when it has no RSS hash for it.
pub const DEFAULT_QUEUE: QueueId = 0;

/// Where a single tuple is expected to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Hashed { hash: u32, queue: QueueId },
    /// The protocol is not hashed; the packet goes to [`DEFAULT_QUEUE`].
    Unhashed,
}

impl Placement {
    pub fn queue(&self) -> QueueId {
        match *self {
            Placement::Hashed { queue, .. } => queue,
            Placement::Unhashed => DEFAULT_QUEUE,
        }
    }
}

/// Predicts the receive queue of synthetic traffic from the device's RSS configuration.
#[derive(Debug, Clone)]
pub struct QueueDistributionPredictor {
    key: RssKey,
    table: IndirectionTable,
    num_queues: u16,
    hashed: HashedProtocols,
}

impl QueueDistributionPredictor {
    pub fn new(
        key: RssKey,
        table: IndirectionTable,
        num_queues: u16,
    ) -> Result<Self, ConfigError> {
        table.ensure_queues_below(num_queues)?;
        Ok(Self {
            key,
            table,
            num_queues,
            hashed: HashedProtocols::default(),
        })
    }

    pub fn with_hashed_protocols(mut self, hashed: HashedProtocols) -> Self {
        self.hashed = hashed;
        self
    }

    pub fn key(&self) -> &RssKey {
        &self.key
    }

    pub fn table(&self) -> &IndirectionTable {
        &self.table
    }

    pub fn num_queues(&self) -> u16 {
        self.num_queues
    }

    pub fn hashed_protocols(&self) -> HashedProtocols {
        self.hashed
    }

    pub fn place(&self, tuple: &PacketTuple) -> Result<Placement, PlaceError> {
        if !self.hashed.hashes(tuple.protocol) {
            return Ok(Placement::Unhashed);
        }
        let input = tuple.hash_input()?;
        let hash = hash_tuple(&input, &self.key)?;
        Ok(Placement::Hashed {
            hash,
            queue: self.table.lookup(hash),
        })
    }

    pub fn queue_for(&self, tuple: &PacketTuple) -> Result<QueueId, PlaceError> {
        self.place(tuple).map(|placement| placement.queue())
    }

    /// Expected per-queue packet counts for one burst of `tuples`.
    ///
    /// Every queue `0..num_queues` appears in the result and the counts sum to `tuples.len()`.
    /// The result depends only on the multiset of tuples.
    pub fn predict(&self, tuples: &[PacketTuple]) -> Result<QueueCounts, PredictError> {
        let mut counts = QueueCounts::zeroed(self.num_queues);
        let mut unhashed = 0u64;

        for (index, tuple) in tuples.iter().enumerate() {
            let placement = self.place(tuple).map_err(|err| match err {
                PlaceError::Config(err) => PredictError::Config(err),
                PlaceError::HashInput(source) => PredictError::HashInput { index, source },
            })?;
            if placement == Placement::Unhashed {
                unhashed += 1;
            }
            counts.add(placement.queue(), 1);
        }

        tracing::debug!(
            tuples = tuples.len(),
            unhashed,
            num_queues = self.num_queues,
            "predicted RSS queue distribution"
        );
        Ok(counts)
    }
}

/// Failure to place a single tuple.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    HashInput(#[from] HashInputError),
}

#[cfg(test)]
mod tests {
    use core::net::Ipv4Addr;

    use super::*;
    use crate::error::TupleField;

    fn predictor(num_queues: u16) -> QueueDistributionPredictor {
        QueueDistributionPredictor::new(
            RssKey::microsoft_default(),
            IndirectionTable::round_robin(128, num_queues).unwrap(),
            num_queues,
        )
        .unwrap()
    }

    #[test]
    fn known_tuple_lands_on_masked_table_entry() {
        // 0x51ccc178 & 0x7f = 0x78 = 120; 120 % 4 = 0.
        let p = predictor(4);
        let tuple = PacketTuple::tcp(
            Ipv4Addr::new(66, 9, 149, 187),
            2794,
            Ipv4Addr::new(161, 142, 100, 80),
            1766,
        );
        assert_eq!(
            p.place(&tuple),
            Ok(Placement::Hashed {
                hash: 0x51cc_c178,
                queue: 0,
            })
        );

        // 0xc626b0ea & 0x7f = 0x6a = 106; 106 % 4 = 2.
        let tuple = PacketTuple::tcp(
            Ipv4Addr::new(199, 92, 111, 2),
            14230,
            Ipv4Addr::new(65, 69, 140, 83),
            4739,
        );
        assert_eq!(p.queue_for(&tuple), Ok(2));
    }

    #[test]
    fn unhashed_traffic_goes_to_queue_zero() {
        let p = predictor(4);
        let ping = PacketTuple::icmp(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(p.place(&ping), Ok(Placement::Unhashed));

        let counts = p.predict(&[ping, ping, ping]).unwrap();
        assert_eq!(counts, QueueCounts::from([(0, 3), (1, 0), (2, 0), (3, 0)]));
    }

    #[test]
    fn protocols_outside_the_hashed_set_are_unhashed() {
        let p = predictor(4).with_hashed_protocols(HashedProtocols::TCP);
        let tuple = PacketTuple::udp(
            Ipv4Addr::new(199, 92, 111, 2),
            14230,
            Ipv4Addr::new(65, 69, 140, 83),
            4739,
        );
        assert_eq!(p.queue_for(&tuple), Ok(DEFAULT_QUEUE));
    }

    #[test]
    fn hash_input_errors_carry_the_tuple_index() {
        let p = predictor(2);
        let good = PacketTuple::udp(Ipv4Addr::new(1, 1, 1, 1), 53, Ipv4Addr::new(2, 2, 2, 2), 53);
        let mut bad = good;
        bad.src_port = None;
        assert_eq!(
            p.predict(&[good, bad]),
            Err(PredictError::HashInput {
                index: 1,
                source: HashInputError::MissingField(TupleField::SrcPort),
            })
        );
    }

    #[test]
    fn table_must_fit_the_queue_count() {
        let err = QueueDistributionPredictor::new(
            RssKey::microsoft_default(),
            IndirectionTable::round_robin(8, 4).unwrap(),
            3,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::QueueOutOfRange {
                index: 3,
                queue: 3,
                num_queues: 3,
            }
        );
    }

    #[test]
    fn empty_batch_predicts_all_zero() {
        let counts = predictor(2).predict(&[]).unwrap();
        assert_eq!(counts.total(), 0);
        assert_eq!(counts.len(), 2);
    }
}
