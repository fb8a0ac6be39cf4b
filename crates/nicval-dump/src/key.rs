use nicval_rss::RssKey;

use crate::error::Result;

/// Parse an RSS key printed as hex.
///
/// Accepts colon-separated octets (`6d:5a:56:da:...`, as ethtool prints them) or one contiguous
/// hex run; whitespace, line breaks and `:`/`-` separators are ignored.
pub fn parse_rss_key(text: &str) -> Result<RssKey> {
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    let hex_digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits.as_str());
    let bytes = hex::decode(hex_digits)?;
    Ok(RssKey::new(bytes)?)
}

#[cfg(test)]
mod tests {
    use nicval_rss::{ConfigError, MICROSOFT_DEFAULT_KEY};

    use super::*;
    use crate::error::DumpError;

    const ETHTOOL_KEY: &str = "6d:5a:56:da:25:5b:0e:c2:41:67:25:3d:43:a3:8f:b0:d0:ca:2b:cb:ae:7b:30:b4:\n\
                               77:cb:2d:a3:80:30:f2:0c:6a:42:b7:3b:be:ac:01:fa";

    #[test]
    fn colon_separated_octets() {
        let key = parse_rss_key(ETHTOOL_KEY).unwrap();
        assert_eq!(key.as_bytes(), &MICROSOFT_DEFAULT_KEY);
    }

    #[test]
    fn contiguous_hex_with_prefix() {
        let key = parse_rss_key(
            "0x6D5A56DA255B0EC24167253D43A38FB0D0CA2BCBAE7B30B477CB2DA38030F20C6A42B73BBEAC01FA",
        )
        .unwrap();
        assert_eq!(key.as_bytes(), &MICROSOFT_DEFAULT_KEY);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            parse_rss_key("6d:5a:zz"),
            Err(DumpError::KeyHex(_))
        ));
        assert_eq!(
            parse_rss_key("6d:5a"),
            Err(DumpError::Config(ConfigError::KeyTooShort {
                required_bits: 128,
                actual_bits: 16,
            }))
        );
    }
}
