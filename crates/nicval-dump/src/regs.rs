use std::collections::BTreeMap;

use crate::error::{DumpError, Result};

/// 32-bit register values keyed by CSR address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterDump {
    regs: BTreeMap<u32, u32>,
}

impl RegisterDump {
    pub fn read(&self, addr: u32) -> Option<u32> {
        self.regs.get(&addr).copied()
    }

    pub fn len(&self) -> usize {
        self.regs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }
}

impl FromIterator<(u32, u32)> for RegisterDump {
    fn from_iter<I: IntoIterator<Item = (u32, u32)>>(iter: I) -> Self {
        Self {
            regs: iter.into_iter().collect(),
        }
    }
}

/// Parse `ADDR: VALUE` (or `ADDR = VALUE`) lines. Both sides are hexadecimal with an optional
/// `0x` prefix; `#` starts a comment.
pub fn parse_register_dump(text: &str) -> Result<RegisterDump> {
    let mut regs = BTreeMap::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let (addr, value) = line
            .split_once(':')
            .or_else(|| line.split_once('='))
            .ok_or(DumpError::MalformedLine { line: line_no })?;
        let addr = parse_hex_u32(addr, line_no)?;
        let value = parse_hex_u32(value, line_no)?;
        if regs.insert(addr, value).is_some() {
            return Err(DumpError::Duplicate {
                line: line_no,
                name: format!("{addr:#x}"),
            });
        }
    }
    Ok(RegisterDump { regs })
}

fn parse_hex_u32(raw: &str, line: usize) -> Result<u32> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    u32::from_str_radix(digits, 16).map_err(|_| DumpError::InvalidNumber {
        line,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colon_and_equals_forms() {
        let dump = parse_register_dump(
            "# rx ring 0\n0x00002810: 0x000003e8\n0x2818 = 0x3ff\n\n3810: c\n",
        )
        .unwrap();
        assert_eq!(dump.read(0x2810), Some(1000));
        assert_eq!(dump.read(0x2818), Some(0x3ff));
        assert_eq!(dump.read(0x3810), Some(12));
        assert_eq!(dump.read(0x3818), None);
        assert_eq!(dump.len(), 3);
    }

    #[test]
    fn bad_values_and_duplicates() {
        assert_eq!(
            parse_register_dump("0x2810: 0xnope"),
            Err(DumpError::InvalidNumber {
                line: 1,
                value: "0xnope".to_string(),
            })
        );
        assert_eq!(
            parse_register_dump("0x2810: 1\n0x2810: 2"),
            Err(DumpError::Duplicate {
                line: 2,
                name: "0x2810".to_string(),
            })
        );
        assert_eq!(
            parse_register_dump("0x2810 1"),
            Err(DumpError::MalformedLine { line: 1 })
        );
    }
}
