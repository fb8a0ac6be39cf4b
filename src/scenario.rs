//! JSON description of one validation pass, as written by shell-driven harnesses.
//!
//! ```json
//! {
//!   "rss": { "dump": "ethtool_x.txt" },
//!   "traffic": {
//!     "sweeps": [{ "protocol": "udp", "src": "10.0.0.1", "dst": "10.0.0.2",
//!                  "src_port": 5000, "dst_port": 4791, "count": 90 }],
//!     "total_sent": 90
//!   },
//!   "counters": { "before": "stats_before.txt", "after": "stats_after.txt" }
//! }
//! ```
//!
//! Paths are handed to the caller's loader unchanged.

use std::net::IpAddr;

use nicval_dump::{
    parse_register_dump, parse_rss_dump, parse_rss_key, parse_stats, CounterSnapshot, DumpError,
};
use nicval_rss::{
    verify_all, Direction, HashedProtocols, IndirectionTable, L4Protocol, PacketTuple, QueueId,
    RingAddressTable, RingCsrLayout, RingId, RingPointer, RingReport,
};
use serde::Deserialize;

use crate::error::SessionError;
use crate::report::ValidationReport;
use crate::session::{sample_rings, DeviceSession, RingCheck};

pub const DEFAULT_QUEUE_COUNTER_PATTERN: &str = "rx_queue_{q}_packets";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub rss: RssSource,
    #[serde(default)]
    pub num_queues: Option<u16>,
    #[serde(default)]
    pub hashed_protocols: Option<HashedProtocols>,
    #[serde(default)]
    pub ignore_queues: Vec<QueueId>,
    pub traffic: Traffic,
    pub counters: Counters,
    #[serde(default)]
    pub rings: Option<Rings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RssSource {
    /// Path of an ethtool-style RSS listing.
    Dump { dump: String },
    /// Key as hex plus explicit table entries.
    Inline { key: String, table: Vec<QueueId> },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Traffic {
    #[serde(default)]
    pub tuples: Vec<PacketTuple>,
    #[serde(default)]
    pub sweeps: Vec<PortSweep>,
    /// Packets the generator reports as sent; defaults to the number of tuples.
    #[serde(default)]
    pub total_sent: Option<u64>,
}

impl Traffic {
    pub fn expand(&self) -> Vec<PacketTuple> {
        let mut tuples = self.tuples.clone();
        for sweep in &self.sweeps {
            tuples.extend(sweep.tuples());
        }
        tuples
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepField {
    #[default]
    SrcPort,
    DstPort,
}

/// `count` flows between two hosts, one per port, starting at the given port.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortSweep {
    pub protocol: L4Protocol,
    pub src: IpAddr,
    pub dst: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
    #[serde(default = "default_sweep_count")]
    pub count: u32,
    #[serde(default)]
    pub vary: SweepField,
}

fn default_sweep_count() -> u32 {
    1
}

impl PortSweep {
    pub fn tuples(&self) -> impl Iterator<Item = PacketTuple> + '_ {
        (0..self.count).map(move |i| {
            // Port numbers wrap like a generator's 16-bit port counter.
            let step = i as u16;
            let (src_port, dst_port) = match self.vary {
                SweepField::SrcPort => (self.src_port.wrapping_add(step), self.dst_port),
                SweepField::DstPort => (self.src_port, self.dst_port.wrapping_add(step)),
            };
            PacketTuple {
                src_addr: Some(self.src),
                dst_addr: Some(self.dst),
                src_port: Some(src_port),
                dst_port: Some(dst_port),
                protocol: self.protocol,
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Counters {
    pub before: String,
    pub after: String,
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_pattern() -> String {
    DEFAULT_QUEUE_COUNTER_PATTERN.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsrLayout {
    pub rx_head: u32,
    pub rx_tail: u32,
    pub tx_head: u32,
    pub tx_tail: u32,
    pub queue_stride: u32,
}

impl From<CsrLayout> for RingCsrLayout {
    fn from(layout: CsrLayout) -> Self {
        RingCsrLayout {
            rx_head: layout.rx_head,
            rx_tail: layout.rx_tail,
            tx_head: layout.tx_head,
            tx_tail: layout.tx_tail,
            queue_stride: layout.queue_stride,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rings {
    /// Register layout; e1000-style when absent.
    #[serde(default)]
    pub layout: Option<CsrLayout>,
    pub before: String,
    pub after: String,
    pub checks: Vec<RingCheckSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RingCheckSpec {
    pub queue: QueueId,
    pub direction: Direction,
    /// `head` (default) or `tail`.
    #[serde(default)]
    pub pointer: RingPointer,
    pub ring_size: u32,
    #[serde(default)]
    pub increment: Option<u64>,
    /// Name of a counter whose delta is the expected pointer advance.
    #[serde(default)]
    pub increment_counter: Option<String>,
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Runs the whole pass. `load` returns the contents of a dump file named in the scenario.
    pub fn run<F>(&self, mut load: F) -> Result<ValidationReport, SessionError>
    where
        F: FnMut(&str) -> Result<String, SessionError>,
    {
        let mut session = self.session(&mut load)?;
        if let Some(hashed) = self.hashed_protocols {
            session = session.with_hashed_protocols(hashed);
        }
        session = session.ignoring_queues(self.ignore_queues.iter().copied());

        let tuples = self.traffic.expand();
        let total_sent = self.traffic.total_sent.unwrap_or(tuples.len() as u64);

        let before = parse_stats(&load(&self.counters.before)?)?;
        let after = parse_stats(&load(&self.counters.after)?)?;
        let delta = before.delta(&after)?;
        let observed = delta.queue_counts(&self.counters.pattern, session.num_queues())?;

        let predicted = session.predict(&tuples)?;
        let verdict = session.reconcile(&predicted, &observed, total_sent);

        let rings = match &self.rings {
            Some(rings) => Some(rings.check(&delta, &mut load)?),
            None => None,
        };

        Ok(ValidationReport {
            predicted,
            observed,
            verdict,
            rings,
        })
    }

    fn session<F>(&self, load: &mut F) -> Result<DeviceSession, SessionError>
    where
        F: FnMut(&str) -> Result<String, SessionError>,
    {
        match &self.rss {
            RssSource::Dump { dump } => {
                let dump = parse_rss_dump(&load(dump)?)?;
                DeviceSession::from_rss_dump(&dump, self.num_queues)
            }
            RssSource::Inline { key, table } => {
                let key = parse_rss_key(key)?;
                let table = IndirectionTable::new(table.clone())?;
                let num_queues = match self.num_queues {
                    Some(n) => n,
                    None => table
                        .max_queue()
                        .checked_add(1)
                        .ok_or(SessionError::UnknownQueueCount)?,
                };
                DeviceSession::new(key, table, num_queues)
            }
        }
    }
}

impl Rings {
    fn check<F>(&self, delta: &CounterSnapshot, load: &mut F) -> Result<RingReport, SessionError>
    where
        F: FnMut(&str) -> Result<String, SessionError>,
    {
        let layout = self
            .layout
            .map(RingCsrLayout::from)
            .unwrap_or(RingCsrLayout::E1000);
        let queues_in = |direction: Direction| {
            self.checks
                .iter()
                .filter(|c| c.direction == direction)
                .map(|c| c.queue.saturating_add(1))
                .max()
                .unwrap_or(0)
        };
        let addresses =
            RingAddressTable::build(&layout, queues_in(Direction::Rx), queues_in(Direction::Tx));

        let checks = self
            .checks
            .iter()
            .map(|wanted| -> Result<RingCheck, SessionError> {
                let ring = RingId {
                    queue: wanted.queue,
                    direction: wanted.direction,
                };
                let increment = match (wanted.increment, &wanted.increment_counter) {
                    (Some(n), _) => n,
                    (None, Some(name)) => delta
                        .get(name)
                        .ok_or_else(|| DumpError::MissingCounter { name: name.clone() })?,
                    (None, None) => return Err(SessionError::MissingIncrement(ring)),
                };
                Ok(RingCheck {
                    ring,
                    pointer: wanted.pointer,
                    ring_size: wanted.ring_size,
                    increment,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let before = parse_register_dump(&load(&self.before)?)?;
        let after = parse_register_dump(&load(&self.after)?)?;
        let samples = sample_rings(&addresses, &before, &after, &checks)?;
        Ok(verify_all(samples))
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn sweeps_vary_the_requested_port() {
        let sweep = PortSweep {
            protocol: L4Protocol::Tcp,
            src: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            dst: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
            src_port: 65534,
            dst_port: 80,
            count: 3,
            vary: SweepField::SrcPort,
        };
        let ports: Vec<_> = sweep
            .tuples()
            .map(|t| (t.src_port.unwrap(), t.dst_port.unwrap()))
            .collect();
        assert_eq!(ports, vec![(65534, 80), (65535, 80), (0, 80)]);
    }

    #[test]
    fn inline_rss_source_and_defaults() {
        let scenario = Scenario::from_json(
            r#"{
                "rss": { "key": "6d5a56da255b0ec24167253d43a38fb0", "table": [0, 1, 1, 0] },
                "traffic": {
                    "tuples": [{ "src_addr": "10.0.0.1", "dst_addr": "10.0.0.2", "protocol": "icmp" }]
                },
                "counters": { "before": "a", "after": "b" }
            }"#,
        )
        .unwrap();
        assert!(matches!(scenario.rss, RssSource::Inline { .. }));
        assert_eq!(scenario.counters.pattern, DEFAULT_QUEUE_COUNTER_PATTERN);
        assert_eq!(scenario.traffic.expand().len(), 1);

        let report = scenario
            .run(|path| {
                Ok(match path {
                    "a" => "rx_queue_0_packets: 5\nrx_queue_1_packets: 5\n",
                    _ => "rx_queue_0_packets: 6\nrx_queue_1_packets: 5\n",
                }
                .to_string())
            })
            .unwrap();
        assert!(report.passed(), "{report:?}");
        assert_eq!(report.predicted.get(0), 1);
        assert_eq!(report.rings, None);
    }

    #[test]
    fn hashed_protocols_limit_what_is_hashed() {
        // Hashes to 0xc626b0ea, which the 4-entry table sends to queue 2.
        let json = |hashed: &str| {
            format!(
                r#"{{
                    "rss": {{
                        "key": "{}",
                        "table": [0, 1, 2, 3]
                    }},
                    {hashed}
                    "traffic": {{
                        "sweeps": [{{ "protocol": "udp", "src": "199.92.111.2", "dst": "65.69.140.83",
                                      "src_port": 14230, "dst_port": 4739, "count": 3 }}]
                    }},
                    "counters": {{ "before": "a", "after": "b" }}
                }}"#,
                hex_key()
            )
        };
        let stats = |path: &str| -> Result<String, SessionError> {
            Ok(match path {
                "a" => "rx_queue_0_packets: 0\nrx_queue_1_packets: 0\nrx_queue_2_packets: 0\nrx_queue_3_packets: 0\n",
                _ => "rx_queue_0_packets: 0\nrx_queue_1_packets: 0\nrx_queue_2_packets: 3\nrx_queue_3_packets: 0\n",
            }
            .to_string())
        };

        let scenario = Scenario::from_json(&json(r#""hashed_protocols": "TCP","#)).unwrap();
        assert_eq!(scenario.hashed_protocols, Some(HashedProtocols::TCP));
        let report = scenario.run(stats).unwrap();
        assert_eq!(report.predicted.get(0), 3);
        assert_eq!(report.predicted.get(2), 0);
        assert!(!report.passed());

        let scenario = Scenario::from_json(&json(r#""hashed_protocols": "TCP | UDP","#)).unwrap();
        assert_eq!(
            scenario.hashed_protocols,
            Some(HashedProtocols::TCP | HashedProtocols::UDP)
        );
        let report = scenario.run(stats).unwrap();
        assert_eq!(report.predicted.get(2), 3);
        assert!(report.passed(), "{report:?}");
    }

    fn hex_key() -> String {
        nicval_rss::MICROSOFT_DEFAULT_KEY
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    #[test]
    fn ring_pointer_defaults_to_head() {
        let check: RingCheckSpec = serde_json::from_str(
            r#"{ "queue": 0, "direction": "rx", "ring_size": 64, "increment": 1 }"#,
        )
        .unwrap();
        assert_eq!(check.pointer, RingPointer::Head);
        let check: RingCheckSpec = serde_json::from_str(
            r#"{ "queue": 0, "direction": "rx", "pointer": "tail", "ring_size": 64, "increment": 1 }"#,
        )
        .unwrap();
        assert_eq!(check.pointer, RingPointer::Tail);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Scenario::from_json(
            r#"{
                "rss": { "dump": "x" },
                "traffic": {},
                "counters": { "before": "a", "after": "b" },
                "colour": "blue"
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::Scenario(_)));
    }
}
