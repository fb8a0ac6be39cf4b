use crate::error::ConfigError;

/// Toeplitz input width of an IPv4 4-tuple: two addresses and two ports.
pub const IPV4_INPUT_BITS: usize = 32 + 32 + 16 + 16;
/// Toeplitz input width of an IPv6 4-tuple.
pub const IPV6_INPUT_BITS: usize = 128 + 128 + 16 + 16;

/// Microsoft's published default RSS key, used by the NDIS verification suite and programmed by
/// most drivers when no key is configured.
#[rustfmt::skip]
pub const MICROSOFT_DEFAULT_KEY: [u8; 40] = [
    0x6d, 0x5a, 0x56, 0xda, 0x25, 0x5b, 0x0e, 0xc2,
    0x41, 0x67, 0x25, 0x3d, 0x43, 0xa3, 0x8f, 0xb0,
    0xd0, 0xca, 0x2b, 0xcb, 0xae, 0x7b, 0x30, 0xb4,
    0x77, 0xcb, 0x2d, 0xa3, 0x80, 0x30, 0xf2, 0x0c,
    0x6a, 0x42, 0xb7, 0x3b, 0xbe, 0xac, 0x01, 0xfa,
];

/// RSS hash key as read back from the device.
///
/// The key is an opaque big-endian bit string; bit 0 is the most significant bit of byte 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RssKey {
    bytes: Box<[u8]>,
}

impl RssKey {
    /// Shortest key that can hash any tuple at all (an IPv4 4-tuple plus one 32-bit window).
    pub const MIN_BITS: usize = IPV4_INPUT_BITS + 32;

    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let bytes = bytes.into().into_boxed_slice();
        let actual_bits = bytes.len() * 8;
        if actual_bits < Self::MIN_BITS {
            return Err(ConfigError::KeyTooShort {
                required_bits: Self::MIN_BITS,
                actual_bits,
            });
        }
        Ok(Self { bytes })
    }

    pub fn microsoft_default() -> Self {
        Self {
            bytes: Box::new(MICROSOFT_DEFAULT_KEY),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Fails unless the key covers `input_bits` of Toeplitz input (every window must be 32 bits
    /// of real key material).
    pub fn ensure_covers(&self, input_bits: usize) -> Result<(), ConfigError> {
        let required_bits = input_bits + 32;
        if self.bit_len() < required_bits {
            return Err(ConfigError::KeyTooShort {
                required_bits,
                actual_bits: self.bit_len(),
            });
        }
        Ok(())
    }

    /// The 32 key bits starting `offset` bits from the most significant bit. Bits past the end
    /// of the key read as zero.
    pub fn window(&self, offset: usize) -> u32 {
        (0..32).fold(0u32, |acc, i| (acc << 1) | u32::from(self.bit(offset + i)))
    }

    pub(crate) fn bit(&self, index: usize) -> bool {
        self.bytes
            .get(index / 8)
            .is_some_and(|byte| byte & (0x80 >> (index % 8)) != 0)
    }
}

impl AsRef<[u8]> for RssKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
