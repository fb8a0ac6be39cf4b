use nicval_dump::{RegisterDump, RssDump};
use nicval_rss::{
    CounterReconciler, HashedProtocols, IndirectionTable, PacketTuple, QueueCounts,
    QueueDistributionPredictor, QueueId, RingAddressTable, RingId, RingPointer, RingPointerSample,
    RssKey, Verdict,
};

use crate::error::SessionError;

/// RSS configuration of one device under test, read once per test group.
#[derive(Debug, Clone)]
pub struct DeviceSession {
    predictor: QueueDistributionPredictor,
    reconciler: CounterReconciler,
}

impl DeviceSession {
    pub fn new(
        key: RssKey,
        table: IndirectionTable,
        num_queues: u16,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            predictor: QueueDistributionPredictor::new(key, table, num_queues)?,
            reconciler: CounterReconciler::new(),
        })
    }

    /// Builds a session from an ethtool-style RSS listing.
    ///
    /// The queue count defaults to the ring count printed in the listing header.
    pub fn from_rss_dump(dump: &RssDump, num_queues: Option<u16>) -> Result<Self, SessionError> {
        if !dump.is_toeplitz() {
            let function = dump.hash_function.clone().unwrap_or_default();
            return Err(SessionError::NotToeplitz(function));
        }
        if let Some(transform) = &dump.input_transformation {
            return Err(SessionError::InputTransformation(transform.clone()));
        }
        let num_queues = num_queues
            .or(dump.ring_count)
            .ok_or(SessionError::UnknownQueueCount)?;
        let key = dump.require_key()?.clone();
        let table = dump.indirection_table()?;
        tracing::info!(
            interface = dump.interface.as_deref().unwrap_or("?"),
            num_queues,
            table_len = table.len(),
            key_bits = key.bit_len(),
            "loaded device RSS configuration"
        );
        Self::new(key, table, num_queues)
    }

    pub fn with_hashed_protocols(mut self, hashed: HashedProtocols) -> Self {
        self.predictor = self.predictor.with_hashed_protocols(hashed);
        self
    }

    /// Excludes `queues` from per-queue reconciliation checks.
    pub fn ignoring_queues(mut self, queues: impl IntoIterator<Item = QueueId>) -> Self {
        self.reconciler = self.reconciler.ignoring(queues);
        self
    }

    pub fn predictor(&self) -> &QueueDistributionPredictor {
        &self.predictor
    }

    pub fn num_queues(&self) -> u16 {
        self.predictor.num_queues()
    }

    pub fn predict(&self, tuples: &[PacketTuple]) -> Result<QueueCounts, SessionError> {
        Ok(self.predictor.predict(tuples)?)
    }

    /// Predicts `tuples` and reconciles the prediction against `observed`.
    pub fn check(
        &self,
        tuples: &[PacketTuple],
        observed: &QueueCounts,
        total_sent: u64,
    ) -> Result<Verdict, SessionError> {
        let predicted = self.predict(tuples)?;
        Ok(self.reconcile(&predicted, observed, total_sent))
    }

    pub fn reconcile(
        &self,
        predicted: &QueueCounts,
        observed: &QueueCounts,
        total_sent: u64,
    ) -> Verdict {
        self.reconciler.reconcile(predicted, observed, total_sent)
    }
}

/// One ring whose `pointer` should have advanced by `increment` descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCheck {
    pub ring: RingId,
    pub pointer: RingPointer,
    pub ring_size: u32,
    pub increment: u64,
}

/// Reads each ring's selected pointer from the before/after register dumps.
pub fn sample_rings(
    addresses: &RingAddressTable,
    before: &RegisterDump,
    after: &RegisterDump,
    checks: &[RingCheck],
) -> Result<Vec<(RingId, RingPointerSample)>, SessionError> {
    checks
        .iter()
        .map(|check| {
            let regs = addresses
                .get(check.ring)
                .ok_or(SessionError::UnknownRing(check.ring))?;
            let addr = regs.address(check.pointer);
            let read = |dump: &RegisterDump, when| {
                dump.read(addr).ok_or(SessionError::MissingRegister {
                    ring: check.ring,
                    addr,
                    when,
                })
            };
            let sample = RingPointerSample::new(
                check.ring_size,
                read(before, "before")?,
                read(after, "after")?,
                check.increment,
            )?;
            Ok((check.ring, sample))
        })
        .collect()
}
