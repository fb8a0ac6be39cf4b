#![forbid(unsafe_code)]

//! Parsers for the text a test harness scrapes from a device under test: RSS listings,
//! statistics listings and register dumps.
//!
//! The parsers only turn text into values for `nicval-rss`; fetching the text (remote shells,
//! debugfs, ...) is the caller's business.

mod error;
mod key;
mod regs;
mod rss;
mod stats;

pub use error::{DumpError, Result};
pub use key::parse_rss_key;
pub use regs::{parse_register_dump, RegisterDump};
pub use rss::{parse_rss_dump, RssDump};
pub use stats::{parse_stats, CounterSnapshot, QUEUE_PLACEHOLDER};
