//! Single-polynomial OKVS
//!
//! The whole map is one polynomial of degree `< n`. Keys map to evaluation
//! points through a public PRF, so no hash keys are needed. Storage is
//! minimal (`m = n`) but encoding is quadratic in `n`.

use std::collections::HashMap;
use std::hash::Hash;

use okvs_core::poly::{evaluate, interpolate};
use okvs_core::{CoreError, Gf2e, Prf, HASH_KEY_BYTES};
use rand::{CryptoRng, RngCore};

use crate::error::{FailureReason, OkvsError, Result};
use crate::factory::OkvsType;
use crate::key::OkvsKey;
use crate::{check_dimensions, check_field_points, sorted_entries, Okvs};

#[derive(Debug, Clone)]
pub struct PolynomialOkvs {
    n: usize,
    l: usize,
    byte_l: usize,
    field: Gf2e,
    points: Prf,
}

impl PolynomialOkvs {
    pub fn new(n: usize, l: usize) -> Result<Self> {
        check_dimensions(n, l)?;
        check_field_points(n, l)?;
        Ok(Self {
            n,
            l,
            byte_l: l / 8,
            field: Gf2e::new(l)?,
            points: Prf::new(&[0u8; HASH_KEY_BYTES])?,
        })
    }

    fn point(&self, key: &[u8]) -> Vec<u8> {
        self.points.bytes(key, self.byte_l)
    }
}

impl Okvs for PolynomialOkvs {
    fn okvs_type(&self) -> OkvsType {
        OkvsType::Polynomial
    }

    fn n(&self) -> usize {
        self.n
    }

    fn l(&self) -> usize {
        self.l
    }

    fn m(&self) -> usize {
        self.n
    }

    /// Two distinct keys share a point with probability about `n^2 / 2^l`
    fn neg_log_failure_probability(&self) -> usize {
        let log_n = (usize::BITS - (self.n.max(1) - 1).leading_zeros()) as usize;
        self.l.saturating_sub(2 * log_n)
    }

    fn encode<K, R>(&self, map: &HashMap<K, Vec<u8>>, rng: &mut R) -> Result<Vec<Vec<u8>>>
    where
        K: OkvsKey + Eq + Hash,
        R: RngCore + CryptoRng + ?Sized,
    {
        let entries = sorted_entries(map, self.n, self.byte_l)?;
        let mut xs: Vec<Vec<u8>> = entries.iter().map(|(k, _)| self.point(k)).collect();
        let mut ys: Vec<Vec<u8>> = entries.iter().map(|(_, v)| v.to_vec()).collect();

        while xs.len() < self.n {
            let x = self.field.random(rng);
            if xs.contains(&x) {
                continue;
            }
            xs.push(x);
            ys.push(self.field.random(rng));
        }

        interpolate(&self.field, &xs, &ys).map_err(|e| match e {
            CoreError::DuplicatePoint(_) => {
                tracing::warn!(n = self.n, l = self.l, "Polynomial point collision");
                FailureReason::DuplicatePoint.into()
            }
            other => OkvsError::Core(other),
        })
    }

    fn decode<K: OkvsKey + ?Sized>(&self, storage: &[Vec<u8>], key: &K) -> Vec<u8> {
        debug_assert_eq!(storage.len(), self.n);
        evaluate(&self.field, storage, &self.point(&key.key_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_round_trip_with_padding() {
        let mut rng = ChaCha20Rng::seed_from_u64(20);
        let okvs = PolynomialOkvs::new(32, 64).unwrap();
        let map: HashMap<u32, Vec<u8>> = (0..20u32).map(|i| (i, vec![i as u8; 8])).collect();

        let storage = okvs.encode(&map, &mut rng).unwrap();
        assert_eq!(storage.len(), 32);
        for (key, value) in &map {
            assert_eq!(&okvs.decode(&storage, key), value);
        }
    }

    #[test]
    fn test_failure_bound() {
        assert_eq!(PolynomialOkvs::new(1, 64).unwrap().neg_log_failure_probability(), 64);
        // ceil(log2 1000) = 10
        assert_eq!(PolynomialOkvs::new(1000, 128).unwrap().neg_log_failure_probability(), 108);
        assert_eq!(PolynomialOkvs::new(1 << 10, 16).unwrap().neg_log_failure_probability(), 0);
    }

    #[test]
    fn test_rejects_more_points_than_field() {
        assert!(PolynomialOkvs::new(256, 8).is_ok());
        assert!(matches!(
            PolynomialOkvs::new(300, 8),
            Err(OkvsError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_full_field_padding_terminates() {
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let okvs = PolynomialOkvs::new(256, 8).unwrap();
        let map = HashMap::from([("a", vec![1u8]), ("b", vec![2u8]), ("c", vec![3u8])]);

        match okvs.encode(&map, &mut rng) {
            Ok(storage) => {
                assert_eq!(storage.len(), 256);
                for (key, value) in &map {
                    assert_eq!(&okvs.decode(&storage, key), value);
                }
            }
            Err(e) => assert_eq!(e.code(), "ENCODING_FAILURE"),
        }
    }

    #[test]
    fn test_keyless_points_agree_across_instances() {
        let a = PolynomialOkvs::new(8, 32).unwrap();
        let b = PolynomialOkvs::new(8, 32).unwrap();
        assert_eq!(a.point(b"same"), b.point(b"same"));
    }
}
