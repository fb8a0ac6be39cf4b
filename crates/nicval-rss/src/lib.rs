#![forbid(unsafe_code)]

//! RSS hash oracle and hardware counter reconciliation.
//!
//! Given the RSS key and indirection table read back from a NIC, this crate predicts which
//! receive queue each synthetic packet should land on, reconciles those predictions with the
//! device's per-queue counters, and checks that descriptor ring pointers wrap modulo the ring size.
//!
//! Everything here is a pure function of its inputs: no device, network or file access.

mod counts;
mod csr;
mod error;
mod indirection;
mod key;
mod predict;
mod reconcile;
mod ring;
mod toeplitz;
mod tuple;

/// Receive/transmit queue index.
pub type QueueId = u16;

pub use counts::QueueCounts;
pub use csr::{RingAddressTable, RingCsrLayout, RingPointer, RingRegisters};
pub use error::{ConfigError, HashInputError, PredictError, TupleField};
pub use indirection::IndirectionTable;
pub use key::{RssKey, IPV4_INPUT_BITS, IPV6_INPUT_BITS, MICROSOFT_DEFAULT_KEY};
pub use predict::{PlaceError, Placement, QueueDistributionPredictor, DEFAULT_QUEUE};
pub use reconcile::{
    reconcile, CounterReconciler, ReconciliationFailure, Verdict, Violation, ViolationKind,
};
pub use ring::{
    verify, verify_all, Direction, RingFailure, RingId, RingPointerSample, RingReport,
    RingWrapError,
};
pub use toeplitz::{hash_tuple, toeplitz_hash};
pub use tuple::{HashTuple, HashedProtocols, L4Protocol, PacketTuple, MAX_INPUT_LEN};
