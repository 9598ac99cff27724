//! PRF (Pseudorandom Function) for hashing keys
//!
//! Messages are compressed with SHA-256 and then expanded by AES-128 in
//! counter mode under the hash key. Every position, bit vector and bucket
//! index in the encoders is derived through this type.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{CoreError, Result};

/// Hash key size in bytes (AES-128 key)
pub const HASH_KEY_BYTES: usize = 16;

const BLOCK_BYTES: usize = 16;

/// Keyed PRF producing bytes and bounded integers
#[derive(Clone)]
pub struct Prf {
    cipher: Aes128,
}

impl std::fmt::Debug for Prf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prf").finish_non_exhaustive()
    }
}

impl Prf {
    /// Create a new PRF instance from a hash key (only the first 16 bytes are used)
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() < HASH_KEY_BYTES {
            return Err(CoreError::KeyLength {
                expected: HASH_KEY_BYTES,
                actual: key.len(),
            });
        }
        let mut aes_key = [0u8; HASH_KEY_BYTES];
        aes_key.copy_from_slice(&key[..HASH_KEY_BYTES]);
        let cipher = Aes128::new(&aes_key.into());
        Ok(Self { cipher })
    }

    /// Pseudorandom bytes of length `len` for `message`
    pub fn bytes(&self, message: &[u8], len: usize) -> Vec<u8> {
        let seed = compress(message, None);
        self.expand(&seed, len)
    }

    /// Pseudorandom integer in `[0, bound)` for `message`. `bound` must be non-zero.
    pub fn integer(&self, message: &[u8], bound: usize) -> usize {
        let seed = compress(message, None);
        self.reduce(&seed, 0, bound)
    }

    /// Like [`Prf::integer`] but with an extra tweak mixed into the message,
    /// used to redraw a position without changing the key bytes.
    pub fn integer_tweaked(&self, message: &[u8], tweak: u64, bound: usize) -> usize {
        let seed = compress(message, Some(tweak));
        self.reduce(&seed, 0, bound)
    }

    /// `count` pseudorandom integers in `[0, bound)` for `message`
    pub fn integers(&self, message: &[u8], count: usize, bound: usize) -> Vec<usize> {
        let seed = compress(message, None);
        (0..count as u64)
            .map(|counter| self.reduce(&seed, counter, bound))
            .collect()
    }

    fn reduce(&self, seed: &[u8; BLOCK_BYTES], counter: u64, bound: usize) -> usize {
        let block = self.encrypt_counter(seed, counter);
        let value = u64::from_le_bytes(block[..8].try_into().unwrap_or([0u8; 8]));
        (value % bound as u64) as usize
    }

    fn expand(&self, seed: &[u8; BLOCK_BYTES], len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len + BLOCK_BYTES);
        let mut counter = 0u64;
        while out.len() < len {
            out.extend_from_slice(&self.encrypt_counter(seed, counter));
            counter += 1;
        }
        out.truncate(len);
        out
    }

    fn encrypt_counter(&self, seed: &[u8; BLOCK_BYTES], counter: u64) -> [u8; BLOCK_BYTES] {
        let mut block = *seed;
        for (b, c) in block[8..].iter_mut().zip(counter.to_le_bytes()) {
            *b ^= c;
        }
        let mut encrypted = block.into();
        self.cipher.encrypt_block(&mut encrypted);
        let mut out = [0u8; BLOCK_BYTES];
        out.copy_from_slice(&encrypted);
        out
    }
}

fn compress(message: &[u8], tweak: Option<u64>) -> [u8; BLOCK_BYTES] {
    let mut hasher = Sha256::new();
    hasher.update(message);
    if let Some(tweak) = tweak {
        hasher.update(tweak.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut seed = [0u8; BLOCK_BYTES];
    seed.copy_from_slice(&digest[..BLOCK_BYTES]);
    seed
}

/// Generate `count` fresh random hash keys
pub fn random_hash_keys<R: RngCore + CryptoRng>(rng: &mut R, count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|_| {
            let mut key = vec![0u8; HASH_KEY_BYTES];
            rng.fill_bytes(&mut key);
            key
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_prf_deterministic() {
        let prf = Prf::new(&[0u8; 16]).unwrap();

        assert_eq!(prf.bytes(b"alice", 37), prf.bytes(b"alice", 37));
        assert_eq!(prf.integer(b"alice", 1000), prf.integer(b"alice", 1000));
    }

    #[test]
    fn test_prf_different_keys() {
        let prf1 = Prf::new(&[0u8; 16]).unwrap();
        let mut key2 = [0u8; 16];
        key2[0] = 1;
        let prf2 = Prf::new(&key2).unwrap();

        assert_ne!(prf1.bytes(b"alice", 32), prf2.bytes(b"alice", 32));
    }

    #[test]
    fn test_prf_short_key_rejected() {
        let result = Prf::new(&[0u8; 8]);
        assert!(matches!(
            result,
            Err(CoreError::KeyLength { expected: 16, actual: 8 })
        ));
    }

    #[test]
    fn test_bytes_prefix_stable() {
        let prf = Prf::new(&[7u8; 16]).unwrap();
        let long = prf.bytes(b"key", 64);
        let short = prf.bytes(b"key", 20);
        assert_eq!(&long[..20], &short[..]);
    }

    #[test]
    fn test_integer_bounded() {
        let prf = Prf::new(&[42u8; 16]).unwrap();
        for i in 0..1000u32 {
            let msg = i.to_le_bytes();
            assert!(prf.integer(&msg, 17) < 17);
            assert!(prf.integer_tweaked(&msg, 3, 5) < 5);
        }
    }

    #[test]
    fn test_tweak_changes_output() {
        let prf = Prf::new(&[42u8; 16]).unwrap();
        let bound = 1 << 40;
        let plain = prf.integer(b"key", bound);
        let tweaked: Vec<_> = (0..4).map(|t| prf.integer_tweaked(b"key", t, bound)).collect();

        assert!(tweaked.iter().all(|&t| t != plain));
        assert_ne!(tweaked[0], tweaked[1]);
    }

    #[test]
    fn test_integers_match_count() {
        let prf = Prf::new(&[1u8; 16]).unwrap();
        let values = prf.integers(b"key", 40, 100);
        assert_eq!(values.len(), 40);
        assert!(values.iter().all(|&v| v < 100));
        assert_eq!(values[0], prf.integer(b"key", 100));
    }

    #[test]
    fn test_random_hash_keys() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let keys = random_hash_keys(&mut rng, 3);
        assert_eq!(keys.len(), 3);
        assert!(keys.iter().all(|k| k.len() == HASH_KEY_BYTES));
        assert_ne!(keys[0], keys[1]);
    }
}
