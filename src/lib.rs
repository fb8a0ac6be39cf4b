#![forbid(unsafe_code)]

//! Device-level validation of NIC receive-side scaling.
//!
//! A [`DeviceSession`] holds the RSS configuration read back from one device; a [`Scenario`]
//! describes one traffic burst together with the counter and register dumps taken around it, and
//! running it yields a [`ValidationReport`].
//!
//! The hash oracle and dump parsers are re-exported as [`rss`] and [`dump`].

mod error;
mod report;
mod scenario;
mod session;

pub use nicval_dump as dump;
pub use nicval_rss as rss;

pub use error::SessionError;
pub use report::ValidationReport;
pub use scenario::{
    Counters, CsrLayout, PortSweep, RingCheckSpec, Rings, RssSource, Scenario, SweepField,
    Traffic, DEFAULT_QUEUE_COUNTER_PATTERN,
};
pub use session::{sample_rings, DeviceSession, RingCheck};
