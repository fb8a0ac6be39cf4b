//! Toeplitz hash as defined by the NDIS Receive Side Scaling specification.
//!
//! For every set bit `i` of the input (MSB first), the 32-bit key window starting at key bit `i`
//! is XORed into the result. The window is kept in a register and shifted one key bit at a time,
//! which is how the hardware implements it.

use crate::error::ConfigError;
use crate::key::RssKey;
use crate::tuple::HashTuple;

/// Hash raw Toeplitz input bytes.
///
/// Key bits past the end of `key` are treated as zero; callers that need the exact hardware
/// result must make sure the key covers `input.len() * 8 + 32` bits (see
/// [`RssKey::ensure_covers`]).
pub fn toeplitz_hash(key: &RssKey, input: &[u8]) -> u32 {
    let mut hash = 0u32;
    let mut window = key.window(0);
    let mut next_key_bit = 32;

    for &byte in input {
        for bit in 0..8 {
            if byte & (0x80 >> bit) != 0 {
                hash ^= window;
            }
            window = (window << 1) | u32::from(key.bit(next_key_bit));
            next_key_bit += 1;
        }
    }

    hash
}

/// Hash a 4-tuple with `key`.
///
/// Fails only when the key is too short for the tuple's address family.
pub fn hash_tuple(tuple: &HashTuple, key: &RssKey) -> Result<u32, ConfigError> {
    key.ensure_covers(tuple.input_bits())?;
    let (buf, len) = tuple.to_input_bytes();
    Ok(toeplitz_hash(key, &buf[..len]))
}
