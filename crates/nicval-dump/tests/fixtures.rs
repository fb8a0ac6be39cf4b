use nicval_dump::{parse_register_dump, parse_rss_dump, parse_stats};
use nicval_rss::{QueueCounts, RssKey};

const RSS_DUMP: &str = include_str!("../../../tests/fixtures/ethtool_x_6rings.txt");
const SYMMETRIC_RSS_DUMP: &str = include_str!("../../../tests/fixtures/ethtool_x_symmetric_xor.txt");
const STATS_BEFORE: &str = include_str!("../../../tests/fixtures/ethtool_s_before.txt");
const STATS_AFTER: &str = include_str!("../../../tests/fixtures/ethtool_s_after.txt");
const REGS_BEFORE: &str = include_str!("../../../tests/fixtures/regs_before.txt");
const REGS_AFTER: &str = include_str!("../../../tests/fixtures/regs_after.txt");

#[test]
fn six_ring_rss_dump() {
    let dump = parse_rss_dump(RSS_DUMP).expect("parse ethtool -x fixture");
    assert_eq!(dump.interface.as_deref(), Some("ens1f0np0"));
    assert_eq!(dump.ring_count, Some(6));
    assert!(dump.is_toeplitz());

    let table = dump.indirection_table().expect("128-entry table");
    assert_eq!(table.len(), 128);
    for (i, &queue) in table.entries().iter().enumerate() {
        assert_eq!(usize::from(queue), i % 6, "entry {i}");
    }
    assert_eq!(dump.require_key().unwrap(), &RssKey::microsoft_default());
    assert_eq!(dump.hash_function.as_deref(), Some("toeplitz"));
    assert_eq!(dump.input_transformation, None);
}

#[test]
fn symmetric_xor_listing_keeps_toeplitz_as_hash_function() {
    let dump = parse_rss_dump(SYMMETRIC_RSS_DUMP).unwrap();
    assert_eq!(dump.interface.as_deref(), Some("ens1f1np1"));
    assert_eq!(dump.hash_function.as_deref(), Some("toeplitz"));
    assert!(dump.is_toeplitz());
    assert_eq!(dump.input_transformation.as_deref(), Some("symmetric-xor"));
}

#[test]
fn stats_delta_per_queue() {
    let before = parse_stats(STATS_BEFORE).unwrap();
    let after = parse_stats(STATS_AFTER).unwrap();
    let delta = before.delta(&after).unwrap();

    assert_eq!(delta.get("rx_packets"), Some(102));
    assert_eq!(delta.get("tx_packets"), Some(2));
    let counts = delta.queue_counts("rx_queue_{q}_packets", 6).unwrap();
    assert_eq!(
        counts,
        QueueCounts::from([(0, 24), (1, 12), (2, 18), (3, 17), (4, 15), (5, 16)])
    );
    assert_eq!(counts.total(), 102);
}

#[test]
fn ring_pointer_dumps() {
    let before = parse_register_dump(REGS_BEFORE).unwrap();
    let after = parse_register_dump(REGS_AFTER).unwrap();
    assert_eq!(before.len(), 6);
    assert_eq!(before.read(0x2810), Some(0x1f8));
    assert_eq!(after.read(0x2810), Some(0x10));
    assert_eq!(after.read(0x3810), Some(0x12));
}
