//! Fixed-parameter PRF mapping `(secret, counter)` to a keystream block
//!
//! The transform is a three-layer integer feed-forward network
//! (36 -> 64 -> 32 -> 32). Its parameters are public and come from a pinned
//! recipe, so every peer builds the identical table:
//!
//! ```text
//! row(l, j) = HKDF-SHA256(ikm = "entangle/prf/parameters")
//!                 .expand("entangle/prf/v1/layer" || l || j_be16, (inputs + 1) * 4)
//! ```
//!
//! Each row decodes as little-endian `u32` words: `inputs` weights then one
//! bias. Neurons accumulate with wrapping 32-bit arithmetic and pass through
//! an integer mixing activation. No floating point is involved anywhere, so
//! results are bit-identical on every platform.
//!
//! # Properties
//!
//! - Determinism: same secret and counter always produce the same block
//! - Parameters carry no secret; changing them is a new `PRF_VERSION`

use std::sync::LazyLock;

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use super::{BLOCK_LEN, PRF_INPUT_LEN, PRF_VERSION, SECRET_LEN, derivation::SharedSecret};

/// Input keying material for the parameter recipe
const PARAMETER_IKM: &[u8] = b"entangle/prf/parameters";

/// Per-row HKDF info prefix
const PARAMETER_LABEL: &[u8] = b"entangle/prf/v1/layer";

/// Layer shapes as `(inputs, outputs)`
const LAYER_SHAPES: [(usize, usize); 3] = [(PRF_INPUT_LEN, 64), (64, 32), (32, BLOCK_LEN)];

static PARAMETERS: LazyLock<ParameterTable> = LazyLock::new(ParameterTable::generate);

/// One dense layer, weights stored row-major (`outputs` rows of `inputs`).
struct Layer {
    inputs: usize,
    weights: Vec<u32>,
    biases: Vec<u32>,
}

impl Layer {
    fn forward(&self, input: &[u32]) -> Vec<u32> {
        debug_assert_eq!(input.len(), self.inputs);

        self.weights
            .chunks_exact(self.inputs)
            .zip(&self.biases)
            .map(|(row, &bias)| {
                let acc = row
                    .iter()
                    .zip(input)
                    .fold(bias, |acc, (&w, &x)| acc.wrapping_add(w.wrapping_mul(x)));
                mix(acc)
            })
            .collect()
    }
}

/// The pinned PRF parameter table.
pub struct ParameterTable {
    layers: Vec<Layer>,
    digest: [u8; 32],
}

impl ParameterTable {
    fn generate() -> Self {
        let hkdf = Hkdf::<Sha256>::new(None, PARAMETER_IKM);

        let mut hasher = Sha256::new();
        hasher.update(PRF_VERSION.to_be_bytes());

        let mut layers = Vec::with_capacity(LAYER_SHAPES.len());
        for (index, &(inputs, outputs)) in LAYER_SHAPES.iter().enumerate() {
            let mut weights = Vec::with_capacity(inputs * outputs);
            let mut biases = Vec::with_capacity(outputs);

            for row in 0..outputs {
                // Capacity: 21 (label) + 1 (layer) + 2 (row) = 24
                let mut info = Vec::with_capacity(24);
                info.extend_from_slice(PARAMETER_LABEL);
                info.push(index as u8);
                info.extend_from_slice(&(row as u16).to_be_bytes());

                let mut okm = vec![0u8; (inputs + 1) * 4];
                let Ok(()) = hkdf.expand(&info, &mut okm) else {
                    unreachable!("rows are far below the HKDF-SHA256 output limit");
                };
                hasher.update(&okm);

                let mut words = okm
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]));
                weights.extend(words.by_ref().take(inputs));
                biases.extend(words);
            }

            debug_assert_eq!(weights.len(), inputs * outputs);
            debug_assert_eq!(biases.len(), outputs);
            layers.push(Layer { inputs, weights, biases });
        }

        Self { layers, digest: hasher.finalize().into() }
    }

    /// SHA-256 over the version and every parameter row, in order.
    ///
    /// Two builds interoperate only if their digests match.
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Total number of weights and biases.
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len() + l.biases.len()).sum()
    }

    fn evaluate(&self, input: &[u8; PRF_INPUT_LEN]) -> [u8; BLOCK_LEN] {
        let mut activations: Vec<u32> = input.iter().map(|&b| u32::from(b)).collect();
        for layer in &self.layers {
            let next = layer.forward(&activations);
            activations.zeroize();
            activations = next;
        }

        let mut block = [0u8; BLOCK_LEN];
        for (byte, value) in block.iter_mut().zip(&activations) {
            *byte = (value >> 24) as u8;
        }
        activations.zeroize();
        block
    }
}

/// The process-wide parameter table, built on first use.
pub fn parameters() -> &'static ParameterTable {
    &PARAMETERS
}

/// Integer activation: full-avalanche 32-bit mix.
fn mix(mut v: u32) -> u32 {
    v ^= v >> 16;
    v = v.wrapping_mul(0x7feb_352d);
    v ^= v >> 15;
    v = v.wrapping_mul(0x846c_a68b);
    v ^= v >> 16;
    v
}

/// One PRF output, bound to the counter it was computed for.
///
/// Should be consumed once and dropped. Zeroized on drop.
pub struct KeystreamBlock {
    bytes: [u8; BLOCK_LEN],
    counter: u32,
}

impl KeystreamBlock {
    /// Block bytes.
    pub fn bytes(&self) -> &[u8; BLOCK_LEN] {
        &self.bytes
    }

    /// Counter value this block was derived from.
    pub fn counter(&self) -> u32 {
        self.counter
    }
}

impl Drop for KeystreamBlock {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// Pack the PRF input: `secret || counter_le32`.
pub(crate) fn pack_input(secret: &SharedSecret, counter: u32) -> [u8; PRF_INPUT_LEN] {
    let mut input = [0u8; PRF_INPUT_LEN];
    input[..SECRET_LEN].copy_from_slice(secret.as_bytes());
    input[SECRET_LEN..].copy_from_slice(&counter.to_le_bytes());
    input
}

/// Compute `F(secret, counter)`.
pub fn prf(secret: &SharedSecret, counter: u32) -> KeystreamBlock {
    let mut input = pack_input(secret, counter);
    let bytes = parameters().evaluate(&input);
    input.zeroize();

    KeystreamBlock { bytes, counter }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential_secret() -> SharedSecret {
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = i as u8;
        }
        SharedSecret::from_bytes(bytes)
    }

    #[test]
    fn parameter_table_digest_is_pinned() {
        assert_eq!(
            hex::encode(parameters().digest()),
            "56479c4e341910b97739ff86c969767c0f276cc3a692efd466694bddc78c312a"
        );
    }

    #[test]
    fn parameter_table_has_expected_shape() {
        // 36*64 + 64 + 64*32 + 32 + 32*32 + 32
        assert_eq!(parameters().parameter_count(), 5504);
    }

    #[test]
    fn first_row_words_are_pinned() {
        let layer = &parameters().layers[0];
        assert_eq!(&layer.weights[..3], &[2_744_454_245, 2_525_635_941, 4_048_410_010]);
        assert_eq!(layer.biases[0], 1_632_801_329);
    }

    #[test]
    fn golden_vectors() {
        let secret = sequential_secret();

        let cases: [(u32, &str); 4] = [
            (0, "488ad434e0f56a55a34bd0700e04d97a04b658e0eb984954ccc2ae675b939ce8"),
            (1, "497c7dc2a6f996837105d5e3a648dcdccec58cdef5afa6cf10e06efa983aec71"),
            (2, "936a67e6703997565a6a4e4ae19025933b51ccb7d997ebb603e7905d20f52a0e"),
            (u32::MAX, "67f048d71145ea7ef50a20d204103ade7e4ec21bbfe2d99fc9534c42f03a8399"),
        ];

        for (counter, expected) in cases {
            let block = prf(&secret, counter);
            assert_eq!(hex::encode(block.bytes()), expected, "counter {counter}");
            assert_eq!(block.counter(), counter);
        }
    }

    #[test]
    fn prf_is_deterministic() {
        let secret = sequential_secret();

        for counter in 0..10 {
            assert_eq!(prf(&secret, counter).bytes(), prf(&secret, counter).bytes());
        }
    }

    #[test]
    fn adjacent_counters_produce_different_blocks() {
        let secret = sequential_secret();

        let a = prf(&secret, 0);
        let b = prf(&secret, 1);

        let differing = a.bytes().iter().zip(b.bytes()).filter(|(x, y)| x != y).count();
        assert!(differing > BLOCK_LEN / 2, "only {differing} bytes differ");
    }

    #[test]
    fn input_packing_is_secret_then_le_counter() {
        let input = pack_input(&sequential_secret(), 0x0403_0201);

        assert_eq!(&input[..4], &[0, 1, 2, 3]);
        assert_eq!(&input[SECRET_LEN..], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn mix_is_not_identity() {
        assert_eq!(mix(0), 0);
        assert_ne!(mix(1), 1);
        assert_ne!(mix(1), mix(2));
    }
}
