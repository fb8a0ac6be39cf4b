//! Parser for ethtool-style RSS listings (`ethtool -x <if>`):
//!
//! ```text
//! RX flow hash indirection table for eth0 with 4 RX ring(s):
//!     0:      0     1     2     3     0     1     2     3
//!     8:      0     1     2     3     0     1     2     3
//! RSS hash key:
//! 6d:5a:56:da:25:5b:0e:c2:41:67:25:3d:43:a3:8f:b0:d0:ca:2b:cb:ae:7b:30:b4:77:cb:2d:a3:80:30:f2:0c:6a:42:b7:3b:be:ac:01:fa
//! RSS hash function:
//!     toeplitz: on
//!     xor: off
//! RSS input transformation:
//!     symmetric-xor: off
//! ```
//!
//! Headers this parser does not know end the current section; their bodies are skipped.

use nicval_rss::{ConfigError, IndirectionTable, QueueId, RssKey};

use crate::error::{DumpError, Result};
use crate::key::parse_rss_key;

const TABLE_HEADER: &str = "RX flow hash indirection table";
const KEY_HEADER: &str = "RSS hash key:";
const HASH_FN_HEADER: &str = "RSS hash function:";
const INPUT_XFRM_HEADER: &str = "RSS input transformation:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RssDump {
    pub interface: Option<String>,
    pub ring_count: Option<u16>,
    pub table: Vec<QueueId>,
    pub key: Option<RssKey>,
    /// Name of the hash function reported as `on`, if the section is present.
    pub hash_function: Option<String>,
    /// Input transformation reported as `on` (e.g. `symmetric-xor`), applied before hashing.
    pub input_transformation: Option<String>,
}

impl RssDump {
    pub fn indirection_table(&self) -> std::result::Result<IndirectionTable, ConfigError> {
        IndirectionTable::new(self.table.clone())
    }

    pub fn require_key(&self) -> Result<&RssKey> {
        self.key
            .as_ref()
            .ok_or(DumpError::MissingSection("RSS hash key"))
    }

    /// True unless the dump names an active hash function other than Toeplitz.
    pub fn is_toeplitz(&self) -> bool {
        self.hash_function
            .as_deref()
            .map_or(true, |name| name.eq_ignore_ascii_case("toeplitz"))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Table,
    Key,
    HashFunction,
    InputTransformation,
    Unknown,
}

/// `RSS hash key:`, `Some other section:`. Table rows and `name: on` lines never end in a colon.
fn is_section_header(line: &str) -> bool {
    line.ends_with(':') && !line.starts_with(|c: char| c.is_ascii_digit())
}

/// `toeplitz: on` -> `Some("toeplitz")`.
fn enabled_name(line: &str, line_no: usize) -> Result<Option<String>> {
    let (name, state) = line
        .split_once(':')
        .ok_or(DumpError::MalformedLine { line: line_no })?;
    Ok((state.trim() == "on").then(|| name.trim().to_string()))
}

pub fn parse_rss_dump(text: &str) -> Result<RssDump> {
    let mut section = Section::Preamble;
    let mut saw_table = false;
    let mut interface = None;
    let mut ring_count = None;
    let mut table = Vec::new();
    let mut key_text: Option<String> = None;
    let mut hash_function = None;
    let mut input_transformation = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(TABLE_HEADER) {
            section = Section::Table;
            saw_table = true;
            (interface, ring_count) = parse_table_header(rest, line_no)?;
            continue;
        }
        if line.starts_with(KEY_HEADER) {
            section = Section::Key;
            key_text = Some(String::new());
            continue;
        }
        if line.starts_with(HASH_FN_HEADER) {
            section = Section::HashFunction;
            continue;
        }
        if line.starts_with(INPUT_XFRM_HEADER) {
            section = Section::InputTransformation;
            continue;
        }
        if is_section_header(line) {
            tracing::debug!(line = line_no, header = line, "skipping unknown section");
            section = Section::Unknown;
            continue;
        }

        match section {
            Section::Preamble | Section::Unknown => {
                tracing::trace!(line = line_no, "skipping line");
            }
            Section::Table => parse_table_row(line, line_no, &mut table)?,
            Section::Key => {
                if let Some(buf) = key_text.as_mut() {
                    buf.push_str(line);
                }
            }
            Section::HashFunction => {
                if let Some(name) = enabled_name(line, line_no)? {
                    hash_function = Some(name);
                }
            }
            Section::InputTransformation => {
                if let Some(name) = enabled_name(line, line_no)? {
                    input_transformation = Some(name);
                }
            }
        }
    }

    if !saw_table {
        return Err(DumpError::MissingSection("indirection table"));
    }

    // Some drivers print "Operation not supported" instead of a key.
    let key = match key_text {
        Some(text) if text.contains(|c: char| c.is_ascii_hexdigit()) && !text.contains(' ') => {
            Some(parse_rss_key(&text)?)
        }
        Some(text) => {
            tracing::debug!(%text, "device did not report an RSS key");
            None
        }
        None => None,
    };

    tracing::debug!(
        entries = table.len(),
        ring_count,
        has_key = key.is_some(),
        ?hash_function,
        ?input_transformation,
        "parsed RSS dump"
    );

    Ok(RssDump {
        interface,
        ring_count,
        table,
        key,
        hash_function,
        input_transformation,
    })
}

/// `for eth0 with 4 RX ring(s):`
fn parse_table_header(rest: &str, line: usize) -> Result<(Option<String>, Option<u16>)> {
    let mut words = rest.split_whitespace();
    let mut interface = None;
    let mut ring_count = None;
    while let Some(word) = words.next() {
        match word {
            "for" => interface = words.next().map(str::to_string),
            "with" => {
                if let Some(count) = words.next() {
                    ring_count = Some(count.parse().map_err(|_| DumpError::InvalidNumber {
                        line,
                        value: count.to_string(),
                    })?);
                }
            }
            _ => {}
        }
    }
    Ok((interface, ring_count))
}

/// `    8:      0     1     2     3`
fn parse_table_row(line: &str, line_no: usize, table: &mut Vec<QueueId>) -> Result<()> {
    let (offset, entries) = line
        .split_once(':')
        .ok_or(DumpError::MalformedLine { line: line_no })?;
    let offset: usize = parse_number(offset.trim(), line_no)?;
    if offset != table.len() {
        return Err(DumpError::TableOffsetGap {
            line: line_no,
            expected: table.len(),
            found: offset,
        });
    }
    for entry in entries.split_whitespace() {
        table.push(parse_number(entry, line_no)?);
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(value: &str, line: usize) -> Result<T> {
    value.parse().map_err(|_| DumpError::InvalidNumber {
        line,
        value: value.to_string(),
    })
}
