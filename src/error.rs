use std::io;

use nicval_dump::DumpError;
use nicval_rss::{ConfigError, PredictError, RingId};
use thiserror::Error;

/// Setup-side failures. Hardware mismatches are never reported through this type; they end up in
/// [`crate::ValidationReport`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error(transparent)]
    Dump(#[from] DumpError),

    #[error("device hashes with {0:?}, not Toeplitz")]
    NotToeplitz(String),

    #[error("device applies the {0:?} input transformation before hashing; plain Toeplitz predictions do not apply")]
    InputTransformation(String),

    #[error("cannot infer the receive queue count; set it explicitly")]
    UnknownQueueCount,

    #[error("no CSR address known for ring {0}")]
    UnknownRing(RingId),

    #[error("register {addr:#x} of ring {ring} missing from the {when} dump")]
    MissingRegister {
        ring: RingId,
        addr: u32,
        when: &'static str,
    },

    #[error("ring {0} check needs either `increment` or `increment_counter`")]
    MissingIncrement(RingId),

    #[error("invalid scenario: {0}")]
    Scenario(#[from] serde_json::Error),

    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}
