//! Garbled Bloom filter
//!
//! Every key hashes to up to `hash_num` rows of a flat table. Encoding
//! secret-shares the value across those rows: one empty row per key is held
//! back to receive the final share. There is no graph and no solver.

use std::collections::HashMap;
use std::hash::Hash;

use okvs_core::xor::{random_row, xor_into, xor_rows};
use okvs_core::{Prf, STAT_SEC_PARAM};
use rand::{CryptoRng, RngCore};

use crate::error::{FailureReason, OkvsError, Result};
use crate::factory::OkvsType;
use crate::fill::fill_empty;
use crate::key::OkvsKey;
use crate::params::gbf_size;
use crate::{check_dimensions, sorted_entries, Okvs};

#[derive(Debug, Clone)]
pub struct GbfOkvs {
    n: usize,
    l: usize,
    byte_l: usize,
    m: usize,
    hash_num: usize,
    prf: Prf,
    parallel: bool,
}

impl GbfOkvs {
    /// A filter with `λ = 40` hash functions, all derived from one key
    pub fn new(n: usize, l: usize, key: &[u8]) -> Result<Self> {
        check_dimensions(n, l)?;
        let prf = Prf::new(key)?;
        Ok(Self {
            n,
            l,
            byte_l: l / 8,
            m: gbf_size(n, STAT_SEC_PARAM),
            hash_num: STAT_SEC_PARAM,
            prf,
            parallel: false,
        })
    }

    /// Use `hash_num` hash functions instead of `λ`. Resizes the table.
    pub fn with_hash_num(mut self, hash_num: usize) -> Result<Self> {
        if hash_num == 0 {
            return Err(OkvsError::PreconditionViolation(
                "GBF needs at least one hash function".into(),
            ));
        }
        self.hash_num = hash_num;
        self.m = gbf_size(self.n, hash_num);
        Ok(self)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn hash_num(&self) -> usize {
        self.hash_num
    }

    /// Distinct rows of a key, first occurrence order
    fn positions(&self, key: &[u8]) -> Vec<usize> {
        let mut positions = Vec::with_capacity(self.hash_num);
        for p in self.prf.integers(key, self.hash_num, self.m) {
            if !positions.contains(&p) {
                positions.push(p);
            }
        }
        positions
    }
}

impl Okvs for GbfOkvs {
    fn okvs_type(&self) -> OkvsType {
        OkvsType::Gbf
    }

    fn n(&self) -> usize {
        self.n
    }

    fn l(&self) -> usize {
        self.l
    }

    fn m(&self) -> usize {
        self.m
    }

    fn neg_log_failure_probability(&self) -> usize {
        self.hash_num
    }

    fn encode<K, R>(&self, map: &HashMap<K, Vec<u8>>, rng: &mut R) -> Result<Vec<Vec<u8>>>
    where
        K: OkvsKey + Eq + Hash,
        R: RngCore + CryptoRng + ?Sized,
    {
        let entries = sorted_entries(map, self.n, self.byte_l)?;
        let mut slots: Vec<Option<Vec<u8>>> = vec![None; self.m];

        for (key, value) in &entries {
            let mut final_slot = None;
            let mut share = value.to_vec();

            for p in self.positions(key) {
                match &slots[p] {
                    Some(existing) => xor_into(&mut share, existing),
                    None if final_slot.is_none() => final_slot = Some(p),
                    None => {
                        let fresh = random_row(rng, self.byte_l);
                        xor_into(&mut share, &fresh);
                        slots[p] = Some(fresh);
                    }
                }
            }

            let Some(p) = final_slot else {
                tracing::warn!(m = self.m, hash_num = self.hash_num, "GBF has no empty slot for key");
                return Err(FailureReason::EmptySlotExhausted.into());
            };
            slots[p] = Some(share);
        }

        Ok(fill_empty(slots, self.byte_l, self.parallel, rng))
    }

    fn decode<K: OkvsKey + ?Sized>(&self, storage: &[Vec<u8>], key: &K) -> Vec<u8> {
        debug_assert_eq!(storage.len(), self.m);
        let positions = self.positions(&key.key_bytes());
        xor_rows(storage, &positions, self.byte_l)
    }
}
