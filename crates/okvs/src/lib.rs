//! okvs: Oblivious key-value stores
//!
//! An OKVS encodes up to `n` key/value pairs into `m` storage rows such that
//! any encoded key decodes to its value by XOR-combining a few key-determined
//! rows, while decoding a key that was never encoded yields a pseudorandom
//! value.
//!
//! # Encoders
//!
//! | Type | Rows `m` | Decode cost | Encode |
//! |------|----------|-------------|--------|
//! | [`PolynomialOkvs`] | `n` | one evaluation of degree `n` | `O(n^2)` |
//! | [`MegaBinOkvs`] | `b * binSize` | one evaluation of degree `binSize` | per-bin interpolation |
//! | [`GbfOkvs`] | `≈ 57.7 n` | `λ` rows | one pass |
//! | [`GctOkvs`] 2-hash | `≈ 2.4 n + rm` | 2 rows + `rm` bits | peel or DFS + small solve |
//! | [`GctOkvs`] 3-hash | `≈ 1.3 n + rm` | 3 rows + `rm` bits | peel + small solve |
//!
//! # Security
//!
//! - **Obliviousness**: storage rows not pinned by an encoded key are
//!   filled from the caller's RNG, so storage reveals nothing about which
//!   keys were encoded beyond `n`.
//! - **Failure**: encoding fails with probability at most
//!   `2^-neg_log_failure_probability()`. Failures are
//!   [`OkvsError::EncodingFailure`] and can be retried with fresh hash keys.
//! - **Hash keys**: decode needs the same hash keys as encode. They are not
//!   secret with respect to the decoding party.

pub mod config;
pub mod error;
pub mod factory;
pub mod gbf;
pub mod gct;
pub mod hypergraph;
pub mod key;
pub mod megabin;
pub mod params;
pub mod polynomial;
pub mod reducer;
pub mod storage;

mod fill;
mod system;

use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::Hash;

use rand::{CryptoRng, RngCore};

pub use config::OkvsConfig;
pub use error::{FailureReason, OkvsError, Result};
pub use factory::{create_okvs, okvs_size, AnyOkvs, OkvsType};
pub use gbf::GbfOkvs;
pub use gct::GctOkvs;
pub use hypergraph::Arity;
pub use key::OkvsKey;
pub use megabin::MegaBinOkvs;
pub use polynomial::PolynomialOkvs;
pub use reducer::ReducerKind;
pub use storage::StorageFrame;

/// The shared encode/decode contract
pub trait Okvs {
    fn okvs_type(&self) -> OkvsType;

    /// Maximum number of keys
    fn n(&self) -> usize;

    /// Value length in bits
    fn l(&self) -> usize;

    /// Number of storage rows
    fn m(&self) -> usize;

    fn byte_l(&self) -> usize {
        self.l() / 8
    }

    /// Space efficiency `n / m`
    fn rate(&self) -> f64 {
        self.n() as f64 / self.m() as f64
    }

    /// `-log2` of the encoding failure probability
    fn neg_log_failure_probability(&self) -> usize;

    /// Encode `map` into `m` rows of `l / 8` bytes.
    ///
    /// Requires `map.len() <= n` and every value to be `l / 8` bytes. Entries
    /// are processed in ascending key-byte order, so the result is a pure
    /// function of the hash keys, the map and the RNG stream.
    fn encode<K, R>(&self, map: &HashMap<K, Vec<u8>>, rng: &mut R) -> Result<Vec<Vec<u8>>>
    where
        K: OkvsKey + Eq + Hash,
        R: RngCore + CryptoRng + ?Sized;

    /// Decode any key against storage produced by [`Okvs::encode`]. Keys that
    /// were not encoded decode to pseudorandom values.
    fn decode<K: OkvsKey + ?Sized>(&self, storage: &[Vec<u8>], key: &K) -> Vec<u8>;
}

/// Reject dimensions no encoder supports
pub(crate) fn check_dimensions(n: usize, l: usize) -> Result<()> {
    if n == 0 {
        return Err(OkvsError::PreconditionViolation(
            "n must be at least 1".into(),
        ));
    }
    if l == 0 || l % 8 != 0 {
        return Err(OkvsError::PreconditionViolation(format!(
            "l must be a positive multiple of 8, got {}",
            l
        )));
    }
    Ok(())
}

/// Reject interpolation sizes GF(2^l) cannot supply distinct points for
pub(crate) fn check_field_points(points: usize, l: usize) -> Result<()> {
    if l < usize::BITS as usize && points > 1usize << l {
        return Err(OkvsError::PreconditionViolation(format!(
            "{} distinct points do not fit in GF(2^{})",
            points, l
        )));
    }
    Ok(())
}

/// Validated entries sorted by key bytes
pub(crate) fn sorted_entries<K: OkvsKey>(
    map: &HashMap<K, Vec<u8>>,
    n: usize,
    byte_l: usize,
) -> Result<Vec<(Cow<'_, [u8]>, &[u8])>> {
    if map.len() > n {
        return Err(OkvsError::PreconditionViolation(format!(
            "{} keys exceed capacity {}",
            map.len(),
            n
        )));
    }

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        if value.len() != byte_l {
            return Err(OkvsError::PreconditionViolation(format!(
                "value has {} bytes, expected {}",
                value.len(),
                byte_l
            )));
        }
        entries.push((key.key_bytes(), value.as_slice()));
    }
    entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    if entries.windows(2).any(|w| w[0].0 == w[1].0) {
        return Err(OkvsError::PreconditionViolation(
            "two keys serialize to the same bytes".into(),
        ));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_points() {
        assert!(check_field_points(256, 8).is_ok());
        assert!(matches!(
            check_field_points(257, 8),
            Err(OkvsError::PreconditionViolation(_))
        ));
        assert!(check_field_points(usize::MAX, 64).is_ok());
        assert!(check_field_points(usize::MAX, 128).is_ok());
    }

    #[test]
    fn test_sorted_entries_order() {
        let map = HashMap::from([("b", vec![2u8]), ("a", vec![1u8]), ("c", vec![3u8])]);
        let entries = sorted_entries(&map, 3, 1).unwrap();
        let keys: Vec<&[u8]> = entries.iter().map(|(k, _)| k.as_ref()).collect();
        assert_eq!(keys, [&b"a"[..], &b"b"[..], &b"c"[..]]);
    }

    #[test]
    fn test_sorted_entries_preconditions() {
        let map = HashMap::from([(1u32, vec![0u8; 4]), (2u32, vec![0u8; 4])]);
        assert!(sorted_entries(&map, 1, 4).is_err());
        assert!(sorted_entries(&map, 2, 8).is_err());
        assert!(sorted_entries(&map, 2, 4).is_ok());
    }

    #[derive(PartialEq, Eq, Hash)]
    struct Labelled {
        label: &'static str,
        id: u32,
    }

    impl OkvsKey for Labelled {
        fn key_bytes(&self) -> Cow<'_, [u8]> {
            Cow::Borrowed(self.label.as_bytes())
        }
    }

    #[test]
    fn test_colliding_key_bytes() {
        let map = HashMap::from([
            (Labelled { label: "x", id: 1 }, vec![0u8]),
            (Labelled { label: "x", id: 2 }, vec![1u8]),
        ]);
        assert_eq!(map.len(), 2);
        let err = sorted_entries(&map, 2, 1).unwrap_err();
        assert!(matches!(err, OkvsError::PreconditionViolation(_)));
    }

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions(1, 8).is_ok());
        assert!(check_dimensions(0, 8).is_err());
        assert!(check_dimensions(4, 12).is_err());
        assert!(check_dimensions(4, 0).is_err());
    }
}
