#![cfg(not(target_arch = "wasm32"))]

use std::fs;
use std::path::{Path, PathBuf};

use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::tempdir;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures")
}

fn scenario(total_sent: Option<u64>) -> Value {
    let ping = json!({ "src_addr": "10.0.0.1", "dst_addr": "10.0.0.2", "protocol": "icmp" });
    let mut traffic = json!({
        "tuples": vec![ping; 8],
        "sweeps": [{
            "protocol": "udp",
            "src": "10.0.0.1",
            "dst": "10.0.0.2",
            "src_port": 5000,
            "dst_port": 4791,
            "count": 90
        }]
    });
    if let Some(total_sent) = total_sent {
        traffic["total_sent"] = json!(total_sent);
    }
    json!({
        "rss": { "dump": "ethtool_x_6rings.txt" },
        "traffic": traffic,
        "counters": { "before": "ethtool_s_before.txt", "after": "ethtool_s_after.txt" },
        "rings": {
            "before": "regs_before.txt",
            "after": "regs_after.txt",
            "checks": [{ "queue": 0, "direction": "tx", "ring_size": 512, "increment_counter": "tx_packets" }]
        }
    })
}

fn write_scenario(dir: &Path, value: &Value) -> PathBuf {
    let path = dir.join("scenario.json");
    fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
    path
}

#[test]
fn passing_device_exits_zero_with_report() {
    let dir = tempdir().unwrap();
    let path = write_scenario(dir.path(), &scenario(None));

    let output = assert_cmd::cargo::cargo_bin_cmd!("nicval-check")
        .arg(&path)
        .arg("--base-dir")
        .arg(fixtures_dir())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["verdict"]["passed"], json!(true));
    assert_eq!(report["verdict"]["slack"], json!(4));
    assert_eq!(report["rings"]["failures"], json!([]));
}

#[test]
fn queue_mismatch_exits_one() {
    let dir = tempdir().unwrap();
    let path = write_scenario(dir.path(), &scenario(Some(102)));

    assert_cmd::cargo::cargo_bin_cmd!("nicval-check")
        .arg(&path)
        .arg("--base-dir")
        .arg(fixtures_dir())
        .arg("--pretty")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"above_slack\""));
}

#[test]
fn dumps_resolve_next_to_the_scenario_by_default() {
    let dir = tempdir().unwrap();
    for entry in fs::read_dir(fixtures_dir()).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    let path = write_scenario(dir.path(), &scenario(None));

    assert_cmd::cargo::cargo_bin_cmd!("nicval-check")
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn missing_dump_is_a_setup_error() {
    let dir = tempdir().unwrap();
    let path = write_scenario(dir.path(), &scenario(None));

    assert_cmd::cargo::cargo_bin_cmd!("nicval-check")
        .arg(&path)
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("ethtool_x_6rings.txt"));
}

#[test]
fn malformed_scenario_is_a_setup_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scenario.json");
    fs::write(&path, "{ \"rss\": 7 }").unwrap();

    assert_cmd::cargo::cargo_bin_cmd!("nicval-check")
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("parse scenario"));
}
