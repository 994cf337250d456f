//! XOR stream cipher over keystream pads
//!
//! Encryption and decryption are the same operation. All functions are pure;
//! the caller decides which counter range a pad comes from.

use std::{fmt, ops::Deref};

use zeroize::Zeroize;

use super::{BLOCK_LEN, derivation::SharedSecret, error::KeystreamError, prf::prf};

/// Keystream bytes ready to mask one message.
///
/// Built from consecutive PRF blocks, truncated to the requested length.
/// Zeroized on drop.
pub struct Pad {
    bytes: Vec<u8>,
    first_counter: u32,
    blocks: usize,
}

impl Pad {
    /// Counter of the first block in this pad.
    pub fn first_counter(&self) -> u32 {
        self.first_counter
    }

    /// Number of PRF blocks consumed to build this pad.
    pub fn blocks(&self) -> usize {
        self.blocks
    }
}

impl Deref for Pad {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pad")
            .field("len", &self.bytes.len())
            .field("first_counter", &self.first_counter)
            .field("blocks", &self.blocks)
            .finish_non_exhaustive()
    }
}

impl Drop for Pad {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// Build a pad of `len` bytes from blocks `start, start + 1, ...`.
///
/// Consumes `ceil(len / BLOCK_LEN)` counter values. Never repeats a block to
/// fill a longer request.
///
/// # Errors
///
/// - `CounterOverflow` if the block range passes `u32::MAX`
pub fn expand_pad(secret: &SharedSecret, start: u32, len: usize) -> Result<Pad, KeystreamError> {
    let blocks = len.div_ceil(BLOCK_LEN);

    let last_offset = blocks.saturating_sub(1);
    let in_range = u32::try_from(last_offset).ok().and_then(|o| start.checked_add(o)).is_some();
    if !in_range {
        return Err(KeystreamError::CounterOverflow { start, blocks });
    }

    let mut bytes = Vec::with_capacity(blocks * BLOCK_LEN);
    for offset in 0..blocks {
        let block = prf(secret, start + offset as u32);
        bytes.extend_from_slice(block.bytes());
    }
    bytes.truncate(len);

    Ok(Pad { bytes, first_counter: start, blocks })
}

/// XOR `data` with the leading bytes of `pad`.
///
/// # Errors
///
/// - `PadTooShort` if `pad` is shorter than `data`
pub fn apply_pad(data: &[u8], pad: &[u8]) -> Result<Vec<u8>, KeystreamError> {
    let mut out = data.to_vec();
    apply_pad_in_place(&mut out, pad)?;
    Ok(out)
}

/// XOR `data` in place with the leading bytes of `pad`.
///
/// # Errors
///
/// - `PadTooShort` if `pad` is shorter than `data`; `data` is left untouched
pub fn apply_pad_in_place(data: &mut [u8], pad: &[u8]) -> Result<(), KeystreamError> {
    if pad.len() < data.len() {
        return Err(KeystreamError::PadTooShort { data_len: data.len(), pad_len: pad.len() });
    }

    for (byte, key) in data.iter_mut().zip(pad) {
        *byte ^= key;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_secret() -> SharedSecret {
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = i as u8;
        }
        SharedSecret::from_bytes(bytes)
    }

    #[test]
    fn apply_twice_restores_data() {
        let pad = expand_pad(&test_secret(), 0, 13).unwrap();
        let plaintext = b"Hello, World!";

        let ciphertext = apply_pad(plaintext, &pad).unwrap();
        assert_ne!(ciphertext.as_slice(), plaintext);

        let decrypted = apply_pad(&ciphertext, &pad).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn longer_pad_is_allowed() {
        let pad = expand_pad(&test_secret(), 0, BLOCK_LEN).unwrap();
        let out = apply_pad(b"hi", &pad).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0], b'h' ^ pad[0]);
        assert_eq!(out[1], b'i' ^ pad[1]);
    }

    #[test]
    fn short_pad_is_rejected() {
        let result = apply_pad(b"hello", &[0u8; 4]);

        assert_eq!(result.unwrap_err(), KeystreamError::PadTooShort { data_len: 5, pad_len: 4 });
    }

    #[test]
    fn short_pad_leaves_data_untouched() {
        let mut data = *b"hello";
        let result = apply_pad_in_place(&mut data, &[0xFF; 2]);

        assert!(result.is_err());
        assert_eq!(&data, b"hello");
    }

    #[test]
    fn empty_data_needs_no_pad() {
        assert_eq!(apply_pad(b"", &[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn single_block_pad_is_prefix_of_block() {
        let secret = test_secret();
        let pad = expand_pad(&secret, 5, 10).unwrap();
        let block = prf(&secret, 5);

        assert_eq!(pad.blocks(), 1);
        assert_eq!(pad.first_counter(), 5);
        assert_eq!(&pad[..], &block.bytes()[..10]);
    }

    #[test]
    fn long_pad_chains_consecutive_blocks() {
        let secret = test_secret();
        let pad = expand_pad(&secret, 0, 40).unwrap();

        assert_eq!(pad.blocks(), 2);
        assert_eq!(&pad[..BLOCK_LEN], prf(&secret, 0).bytes());
        assert_eq!(&pad[BLOCK_LEN..], &prf(&secret, 1).bytes()[..8]);
        // A repeated block would make the second chunk equal the first
        assert_ne!(&pad[BLOCK_LEN..40], &pad[..8]);
    }

    #[test]
    fn exact_block_multiple_consumes_exact_blocks() {
        let pad = expand_pad(&test_secret(), 0, 3 * BLOCK_LEN).unwrap();
        assert_eq!(pad.blocks(), 3);
        assert_eq!(pad.len(), 3 * BLOCK_LEN);
    }

    #[test]
    fn last_counter_is_usable() {
        let pad = expand_pad(&test_secret(), u32::MAX, BLOCK_LEN).unwrap();
        assert_eq!(pad.first_counter(), u32::MAX);
    }

    #[test]
    fn range_past_last_counter_is_rejected() {
        let result = expand_pad(&test_secret(), u32::MAX, BLOCK_LEN + 1);

        assert!(matches!(
            result,
            Err(KeystreamError::CounterOverflow { start: u32::MAX, blocks: 2 })
        ));
    }
}
